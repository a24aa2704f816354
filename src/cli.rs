use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, instrument};

use crate::aliyun::SwasClient;
use crate::config::{apply_env_overrides, SystemConfig};
use crate::secrets::{mask_secret, SecretString};
use crate::types::Result;

#[derive(Parser, Debug)]
#[command(name = "cloud-firewall")]
#[command(about = "Allow-list a client's public IP on a cloud server firewall")]
#[command(long_about = "
A small HTTP service that adds or updates a firewall rule on an Alibaba Cloud
Simple Application Server instance so that the calling machine's public IP
is allowed through.

Settings come from a TOML file, FW_* environment variables and the flags
below, in increasing order of precedence.
")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path (missing file means built-in defaults)
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Bind address (empty for all interfaces)
    #[arg(long)]
    pub addr: Option<String>,

    /// Listen port
    #[arg(long)]
    pub port: Option<u16>,

    /// Shared token expected in every request
    #[arg(long)]
    pub token: Option<String>,

    /// Alibaba Cloud AccessKey ID
    #[arg(long)]
    pub ali_key: Option<String>,

    /// Alibaba Cloud AccessKey secret
    #[arg(long)]
    pub ali_secret: Option<String>,

    /// Tencent Cloud SecretId
    #[arg(long)]
    pub tencent_key: Option<String>,

    /// Tencent Cloud SecretKey
    #[arg(long)]
    pub tencent_secret: Option<String>,

    /// Override log level
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Run the allow-list server (default if no subcommand given)
    Run(RunArgs),
    /// Validate the resolved configuration
    Validate,
    /// Show detailed version and build information
    Version,
}

#[derive(Args, Clone, Debug, Default)]
pub struct RunArgs {
    /// Set log format
    #[arg(long)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Get effective log level considering verbose/quiet flags
    pub fn effective_log_level(&self) -> LogLevel {
        if self.verbose {
            LogLevel::Debug
        } else if self.quiet {
            LogLevel::Error
        } else {
            self.log_level.clone().unwrap_or(LogLevel::Info)
        }
    }

    /// Convert LogLevel enum to string for logging module
    pub fn log_level_to_str(&self) -> &'static str {
        match self.effective_log_level() {
            LogLevel::Trace => crate::logging::level::TRACE,
            LogLevel::Debug => crate::logging::level::DEBUG,
            LogLevel::Info => crate::logging::level::INFO,
            LogLevel::Warn => crate::logging::level::WARN,
            LogLevel::Error => crate::logging::level::ERROR,
        }
    }

    /// Log level override, only when a flag asked for one
    pub fn log_level_override(&self) -> Option<&'static str> {
        if self.log_level.is_some() || self.verbose || self.quiet {
            Some(self.log_level_to_str())
        } else {
            None
        }
    }

    /// Get log format override from CLI arguments
    pub fn log_format_override(&self) -> Option<&'static str> {
        match &self.command {
            Some(Commands::Run(args)) => args.log_format.as_ref().map(|fmt| match fmt {
                LogFormat::Json => crate::logging::format::JSON,
                LogFormat::Pretty => crate::logging::format::PRETTY,
            }),
            _ => None,
        }
    }

    /// Load the file (or defaults), then apply environment and flag overrides
    pub fn resolve_config(&self) -> Result<SystemConfig> {
        let mut config = SystemConfig::load_or_default(&self.config)?;
        apply_env_overrides(&mut config);
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut SystemConfig) {
        if let Some(addr) = &self.addr {
            config.server.addr = addr.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(token) = &self.token {
            config.security.token = SecretString::new(token.as_str());
        }
        if let Some(key) = &self.ali_key {
            config.ali.key = SecretString::new(key.as_str());
        }
        if let Some(secret) = &self.ali_secret {
            config.ali.secret = SecretString::new(secret.as_str());
        }
        if let Some(key) = &self.tencent_key {
            config.tencent.key = SecretString::new(key.as_str());
        }
        if let Some(secret) = &self.tencent_secret {
            config.tencent.secret = SecretString::new(secret.as_str());
        }
        if let Some(level) = self.log_level_override() {
            config.logging.level = level.to_string();
        }
    }
}

/// Run the allow-list server
#[instrument(skip_all)]
pub async fn run_server(system_config: SystemConfig) -> Result<()> {
    system_config.validate()?;

    info!(
        addr = %system_config.listen_address()?,
        ali_endpoint = %system_config.ali.endpoint,
        ali_key = %mask_secret(system_config.ali.key.expose()),
        tencent_configured = !system_config.tencent.key.is_empty(),
        "Configuration loaded successfully"
    );

    let provider = Arc::new(SwasClient::new(&system_config.ali)?);

    // Set up graceful shutdown
    let shutdown_signal = setup_shutdown_signal();

    crate::http::start_server(system_config, provider, shutdown_signal).await
}

/// Validate configuration
#[instrument(skip_all)]
pub async fn validate_config(cli: &Cli, system_config: SystemConfig) -> Result<()> {
    info!(config_path = %cli.config.display(), "Validating configuration...");

    match system_config.validate() {
        Ok(()) => {
            info!(
                config_path = %cli.config.display(),
                listen = %system_config.listen_address()?,
                ali_endpoint = %system_config.ali.endpoint,
                page_size = system_config.ali.page_size,
                metrics_enabled = system_config.monitoring.metrics_enabled,
                "Configuration is valid"
            );
            Ok(())
        }
        Err(e) => {
            error!(
                config_path = %cli.config.display(),
                error = %e,
                "Configuration validation failed"
            );
            Err(e)
        }
    }
}

/// Show version and build information
#[instrument]
pub async fn show_version() -> Result<()> {
    println!("cloud-firewall {}", env!("CARGO_PKG_VERSION"));
    println!("Description: {}", env!("CARGO_PKG_DESCRIPTION"));
    println!("License: {}", env!("CARGO_PKG_LICENSE"));
    println!();

    println!("Build Information:");
    println!(
        "  Build Profile: {}",
        if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        }
    );
    println!();

    println!("Runtime Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Architecture: {}", std::env::consts::ARCH);

    Ok(())
}

/// Resolve when Ctrl+C or SIGTERM arrives
pub async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received SIGTERM");
        },
    }
}
