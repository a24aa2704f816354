use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use crate::secrets::SecretString;
use crate::types::{ConfigError, Result};

/// System configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub ali: AliConfig,
    #[serde(default)]
    pub tencent: CloudCredentials,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address; empty means all interfaces
    #[serde(default)]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Shared token every allow-list request must carry
    #[serde(default)]
    pub token: SecretString,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

/// Access key pair for a cloud vendor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudCredentials {
    #[serde(default)]
    pub key: SecretString,
    #[serde(default)]
    pub secret: SecretString,
}

/// Alibaba Cloud Simple Application Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliConfig {
    #[serde(default)]
    pub key: SecretString,
    #[serde(default)]
    pub secret: SecretString,
    #[serde(default = "default_ali_endpoint")]
    pub endpoint: String,
    /// HTTP client timeout in seconds
    #[serde(default = "default_ali_timeout")]
    pub timeout: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl SystemConfig {
    /// Load system configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Unreadable {
            path: path_str,
            source,
        })?;

        let config: SystemConfig = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Load from file, falling back to built-in defaults when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    /// Socket address the server binds to
    pub fn listen_address(&self) -> Result<SocketAddr> {
        let addr = self.server.addr.trim();
        if addr.is_empty() {
            return Ok(SocketAddr::new(
                IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                self.server.port,
            ));
        }

        let ip = addr
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .map_err(|e| crate::types::Error::Validation {
                field: "server.addr".to_string(),
                message: format!("Invalid bind address '{}': {}", addr, e),
            })?;

        Ok(SocketAddr::new(ip, self.server.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: String::new(),
            port: default_port(),
            max_request_size: default_max_request_size(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: default_metrics_enabled(),
            metrics_path: default_metrics_path(),
        }
    }
}

impl Default for AliConfig {
    fn default() -> Self {
        Self {
            key: SecretString::default(),
            secret: SecretString::default(),
            endpoint: default_ali_endpoint(),
            timeout: default_ali_timeout(),
            page_size: default_page_size(),
        }
    }
}

// Default value functions
fn default_port() -> u16 {
    8080
}

fn default_max_request_size() -> String {
    "64KB".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_ali_endpoint() -> String {
    "swas.cn-shanghai.aliyuncs.com".to_string()
}

fn default_ali_timeout() -> u64 {
    10
}

fn default_page_size() -> u32 {
    100
}
