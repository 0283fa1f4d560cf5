/// Configuration loading from TOML file
use crate::error::{BridgeError, Result};
use crate::types::Config;
use std::path::Path;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| BridgeError::ConfigError(format!("Failed to read config file: {}", e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| BridgeError::ConfigError(format!("Failed to parse config: {}", e)))?;

    // Validate config
    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<()> {
    // Validate endpoints
    for (field, value) in [
        ("auth_root", &config.auth_root),
        ("oms_root", &config.oms_root),
        ("api_root", &config.api_root),
    ] {
        if !value.starts_with("http://") && !value.starts_with("https://") {
            return Err(BridgeError::ConfigError(format!(
                "{} must be an absolute http(s) URL, got: {}",
                field, value
            )));
        }
        if value.ends_with('/') {
            return Err(BridgeError::ConfigError(format!(
                "{} must not carry a trailing slash: {}",
                field, value
            )));
        }
    }

    // Validate server binding
    if config.host.is_empty() {
        return Err(BridgeError::ConfigError("host is empty".to_string()));
    }
    if config.port == 0 {
        return Err(BridgeError::ConfigError("port must be non-zero".to_string()));
    }

    // Validate timeouts and TTLs
    if config.http_timeout_secs == 0 {
        return Err(BridgeError::ConfigError(
            "http_timeout_secs must be >= 1".to_string(),
        ));
    }
    // Bounded above so chrono duration math cannot overflow
    if config.session_ttl_hours <= 0 || config.session_ttl_hours > 8760 {
        return Err(BridgeError::ConfigError(format!(
            "session_ttl_hours must be between 1 and 8760, got: {}",
            config.session_ttl_hours
        )));
    }

    Ok(())
}
