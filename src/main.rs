mod aliyun;
mod cli;
mod config;
mod firewall;
mod http;
mod logging;
mod metrics;
mod secrets;
mod types;

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Commands, RunArgs};
use crate::types::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Version needs no configuration; everything else resolves it up front so
    // logging can honor the configured level and format
    let system_config = match &cli.command {
        Some(Commands::Version) => None,
        _ => Some(cli.resolve_config()),
    };

    crate::logging::init(
        cli.log_level_override(),
        cli.log_format_override(),
        system_config.as_ref().and_then(|c| c.as_ref().ok()),
    )?;

    // Initialize metrics registry
    crate::metrics::init_metrics();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting cloud-firewall");

    let command = cli
        .command
        .clone()
        .unwrap_or_else(|| Commands::Run(RunArgs::default()));

    match command {
        Commands::Run(_) => {
            let config = resolved(&cli, system_config)?;
            cli::run_server(config).await
        }
        Commands::Validate => {
            let config = resolved(&cli, system_config)?;
            cli::validate_config(&cli, config).await
        }
        Commands::Version => cli::show_version().await,
    }
}

fn resolved(
    cli: &Cli,
    system_config: Option<Result<config::SystemConfig>>,
) -> Result<config::SystemConfig> {
    match system_config {
        Some(result) => result,
        None => cli.resolve_config(),
    }
}
