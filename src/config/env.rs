//! Environment variable overrides.
//!
//! Every supported variable uses the `FW_` prefix with the config key's dots
//! turned into underscores (`ali.key` -> `FW_ALI_KEY`). Unset or empty
//! variables leave the file value in place.

use tracing::warn;

use super::types::SystemConfig;
use crate::secrets::SecretString;

pub const ENV_PREFIX: &str = "FW";

/// Apply `FW_*` environment variables on top of a loaded config
pub fn apply_env_overrides(config: &mut SystemConfig) {
    // Server overrides
    if let Some(v) = opt_env("ADDR") {
        config.server.addr = v;
    }
    if let Some(v) = opt_env("PORT") {
        match v.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!(value = %v, "Ignoring invalid {}_PORT", ENV_PREFIX),
        }
    }

    // Shared token
    if let Some(v) = opt_env("TOKEN") {
        config.security.token = SecretString::new(v);
    }

    // Logging overrides
    if let Some(v) = opt_env("LOG_LEVEL") {
        config.logging.level = v.to_ascii_lowercase();
    }
    if let Some(v) = opt_env("LOG_FORMAT") {
        config.logging.format = v.to_ascii_lowercase();
    }

    // Cloud credentials
    if let Some(v) = opt_env("ALI_KEY") {
        config.ali.key = SecretString::new(v);
    }
    if let Some(v) = opt_env("ALI_SECRET") {
        config.ali.secret = SecretString::new(v);
    }
    if let Some(v) = opt_env("ALI_ENDPOINT") {
        config.ali.endpoint = v;
    }
    if let Some(v) = opt_env("TENCENT_KEY") {
        config.tencent.key = SecretString::new(v);
    }
    if let Some(v) = opt_env("TENCENT_SECRET") {
        config.tencent.secret = SecretString::new(v);
    }
}

fn opt_env(key: &str) -> Option<String> {
    std::env::var(format!("{}_{}", ENV_PREFIX, key))
        .ok()
        .filter(|v| !v.is_empty())
}
