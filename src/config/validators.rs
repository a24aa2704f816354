use super::types::SystemConfig;
use crate::types::Result;

// Validation helper functions

/// Validate that a required secret is set
pub(crate) fn validate_required_secret(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(crate::types::Error::Validation {
            field: field.to_string(),
            message: "Value must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Validate positive timeout value
pub(crate) fn validate_positive_timeout(value: u64, field: &str) -> Result<()> {
    if value == 0 {
        return Err(crate::types::Error::Validation {
            field: field.to_string(),
            message: "Timeout must be greater than 0".to_string(),
        });
    }
    Ok(())
}

/// Validate a numeric value against an inclusive range
pub(crate) fn validate_range(value: u32, field: &str, min: u32, max: u32) -> Result<()> {
    if value < min {
        return Err(crate::types::Error::Validation {
            field: field.to_string(),
            message: format!("Value {} is below minimum allowed value {}", value, min),
        });
    }
    if value > max {
        return Err(crate::types::Error::Validation {
            field: field.to_string(),
            message: format!("Value {} exceeds maximum allowed value {}", value, max),
        });
    }
    Ok(())
}

/// Validate an HTTP path used for a route
pub(crate) fn validate_route_path(path: &str, field: &str) -> Result<()> {
    if !path.starts_with('/') || path.len() < 2 {
        return Err(crate::types::Error::Validation {
            field: field.to_string(),
            message: format!("Path '{}' must start with '/' and name a route", path),
        });
    }
    if path == "/ali/add" {
        return Err(crate::types::Error::Validation {
            field: field.to_string(),
            message: "Path collides with the allow-list endpoint".to_string(),
        });
    }
    Ok(())
}

/// Validate that a list and a mutation both fit inside the request timeout
pub(crate) fn validate_provider_timeout(
    provider_timeout: u64,
    request_timeout: u64,
) -> Result<()> {
    if provider_timeout.saturating_mul(2) >= request_timeout {
        return Err(crate::types::Error::Validation {
            field: "ali.timeout".to_string(),
            message: format!(
                "Two provider calls of {}s must fit inside server.request_timeout ({}s)",
                provider_timeout, request_timeout
            ),
        });
    }
    Ok(())
}

/// Parse size strings like "1MB", "500KB", "2GB" into bytes
pub fn parse_size_string(size_str: &str) -> std::result::Result<usize, String> {
    let size_str = size_str.trim().to_uppercase();

    if size_str.is_empty() {
        return Err("Empty size string".to_string());
    }

    if let Some(number_part) = size_str.strip_suffix("GB") {
        return parse_number(number_part).map(|n| n * 1024 * 1024 * 1024);
    }

    if let Some(number_part) = size_str.strip_suffix("MB") {
        return parse_number(number_part).map(|n| n * 1024 * 1024);
    }

    if let Some(number_part) = size_str.strip_suffix("KB") {
        return parse_number(number_part).map(|n| n * 1024);
    }

    if let Some(number_part) = size_str.strip_suffix("B") {
        return parse_number(number_part);
    }

    // No suffix, assume bytes
    parse_number(&size_str)
}

fn parse_number(number_str: &str) -> std::result::Result<usize, String> {
    number_str
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("Invalid number: {}", number_str))
}

/// Validate request size string
pub(crate) fn validate_request_size(size: &str) -> Result<()> {
    let bytes = parse_size_string(size).map_err(|message| crate::types::Error::Validation {
        field: "server.max_request_size".to_string(),
        message,
    })?;

    if bytes == 0 {
        return Err(crate::types::Error::Validation {
            field: "server.max_request_size".to_string(),
            message: "Request size must be greater than 0".to_string(),
        });
    }
    Ok(())
}

impl SystemConfig {
    /// Validate the configuration before serving
    pub fn validate(&self) -> Result<()> {
        self.listen_address()?;

        validate_request_size(&self.server.max_request_size)?;
        validate_positive_timeout(self.server.request_timeout, "server.request_timeout")?;

        validate_required_secret(self.security.token.expose(), "security.token")?;

        if self.monitoring.metrics_enabled {
            validate_route_path(&self.monitoring.metrics_path, "monitoring.metrics_path")?;
        }

        validate_required_secret(self.ali.key.expose(), "ali.key")?;
        validate_required_secret(self.ali.secret.expose(), "ali.secret")?;
        validate_required_secret(&self.ali.endpoint, "ali.endpoint")?;
        validate_positive_timeout(self.ali.timeout, "ali.timeout")?;
        validate_range(self.ali.page_size, "ali.page_size", 1, 100)?;
        validate_provider_timeout(self.ali.timeout, self.server.request_timeout)?;

        Ok(())
    }

    /// Request body limit in bytes
    pub fn max_request_bytes(&self) -> usize {
        parse_size_string(&self.server.max_request_size).unwrap_or(64 * 1024)
    }
}
