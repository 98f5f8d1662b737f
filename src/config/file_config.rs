//! Writing configuration files.
//!
//! # Configuration File Format
//!
//! ```toml
//! [upstream]
//! base_url = "https://api.materialsproject.org/"
//! api_key = "your-api-key"
//! timeout_secs = 30
//! connect_timeout_secs = 10
//!
//! [server]
//! bind = "127.0.0.1:3000"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use std::path::Path;

use super::Config;

/// Serialize `config` to TOML and write it to `path`.
///
/// The API key is never written.
pub fn write_config(config: &Config, path: &Path) -> Result<(), ConfigFileError> {
    let content = to_toml(config)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
    }

    std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
}

/// Render `config` as TOML
pub fn to_toml(config: &Config) -> Result<String, ConfigFileError> {
    toml::to_string_pretty(config).map_err(|e| ConfigFileError::Serialize(e.to_string()))
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}
