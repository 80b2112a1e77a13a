//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use bytemeter_core::error::{BytemeterError, Result};

pub use schema::{GatewayConfig, GatewaySection, KeyConfig, MeterConfig};

/// Environment variable overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "BYTEMETER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "bytemeter.yaml";

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| BytemeterError::Io(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| BytemeterError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Config path from [`CONFIG_PATH_ENV`], falling back to [`DEFAULT_CONFIG_PATH`].
pub fn path_from_env() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
