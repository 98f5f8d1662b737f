//! Configuration management.
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! `MATERIALS_GATEWAY_*` environment variables (`__` separates sections, e.g.
//! `MATERIALS_GATEWAY_UPSTREAM__TIMEOUT_SECS=60`). The API key additionally
//! falls back to `MP_API_KEY`.

mod file_config;

pub use file_config::{to_toml, write_config, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "MATERIALS_GATEWAY";

/// Environment variable holding the Materials Project API key
pub const API_KEY_ENV: &str = "MP_API_KEY";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "materials-gateway.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Materials Project connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Never written back out by [`write_config`]
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Bound on each upstream call, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.materialsproject.org/".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` for structured output; anything else is human-readable
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|format| format.eq_ignore_ascii_case("json"))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from an optional file plus the process environment
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut config = build(path, config::Environment::with_prefix(ENV_PREFIX))?;
    if config.upstream.api_key.is_none() {
        config.upstream.api_key = std::env::var(API_KEY_ENV).ok();
    }
    config.upstream.api_key = config
        .upstream
        .api_key
        .filter(|key| !key.trim().is_empty());
    Ok(config)
}

fn build(path: Option<&Path>, env: config::Environment) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).required(true));
    }

    let settings = builder
        .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
        .build()?;

    settings.try_deserialize()
}

/// Locate a config file: `./materials-gateway.toml`, then
/// `<config dir>/materials-gateway/config.toml`
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("materials-gateway").join("config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix(ENV_PREFIX).source(Some(vars.into_iter().collect()))
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.upstream.base_url, "https://api.materialsproject.org/");
        assert_eq!(config.upstream.timeout_secs, 30);
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_build_without_sources_gives_defaults() {
        let config = build(None, env(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_file_then_env_layering() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        std::fs::write(
            &path,
            r#"
[upstream]
base_url = "https://staging.example.org/"
api_key = "from-file"
timeout_secs = 12

[logging]
format = "json"
"#,
        )
        .unwrap();

        let config = build(
            Some(&path),
            env(&[
                ("MATERIALS_GATEWAY_UPSTREAM__TIMEOUT_SECS", "45"),
                ("MATERIALS_GATEWAY_SERVER__BIND", "0.0.0.0:8080"),
            ]),
        )
        .unwrap();

        assert_eq!(config.upstream.base_url, "https://staging.example.org/");
        assert_eq!(config.upstream.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.upstream.timeout_secs, 45);
        assert_eq!(config.upstream.connect_timeout_secs, 10);
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = build(Some(Path::new("/nonexistent/gateway.toml")), env(&[]));
        assert!(result.is_err());
    }
}
