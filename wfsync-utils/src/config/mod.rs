//! Configuration loading
//!
//! Tuning files may be TOML, JSON or YAML; the format is picked from the file
//! extension. Credentials live separately in `.env` (see [`credentials`]).

pub mod credentials;

pub use credentials::LlmCredentials;

use serde::Deserialize;
use std::path::Path;

/// Load configuration from file (auto-detects format)
pub fn load_config<T>(path: &Path) -> crate::Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    let content = std::fs::read_to_string(path)?;

    match extension.as_str() {
        "toml" => toml::from_str(&content)
            .map_err(|e| crate::UtilError::Config(format!("TOML parse error: {e}"))),
        "json" => serde_json::from_str(&content)
            .map_err(|e| crate::UtilError::Config(format!("JSON parse error: {e}"))),
        "yml" | "yaml" => serde_yaml::from_str(&content)
            .map_err(|e| crate::UtilError::Config(format!("YAML parse error: {e}"))),
        _ => Err(crate::UtilError::Config(format!(
            "Unsupported config format: {extension}"
        ))),
    }
}

/// Load configuration if the file exists, defaults otherwise
pub fn load_config_or_default<T>(path: &Path) -> crate::Result<T>
where
    T: Default + for<'de> Deserialize<'de>,
{
    if path.exists() {
        tracing::info!("Loading settings from {}", path.display());
        load_config(path)
    } else {
        tracing::debug!("No settings file at {}, using defaults", path.display());
        Ok(T::default())
    }
}
