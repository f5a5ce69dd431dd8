//! CLI configuration loading from file and environment variables.

use serde::Deserialize;
use stmtwrap_db::{ConnectOptions, WrapperSettings};
use thiserror::Error;

/// Top-level CLI configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Connection parameters.
    #[serde(default)]
    pub database: ConnectOptions,

    /// Wrapper runtime settings.
    #[serde(default)]
    pub wrapper: WrapperSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "warn", "stmtwrap_db=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override carried an unusable value.
    #[error("invalid value for {var}: {reason}")]
    InvalidEnv {
        /// The offending variable.
        var: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies environment overrides from the process environment.
///
/// Environment variable overrides:
/// - `STMTWRAP_DB_HOST` overrides `database.host`
/// - `STMTWRAP_DB_USER` overrides `database.user`
/// - `STMTWRAP_DB_PASSWORD` overrides `database.password`
/// - `STMTWRAP_DB_NAME` overrides `database.database`
/// - `STMTWRAP_DB_CHARSET` overrides `database.charset`
/// - `STMTWRAP_ERROR_MODE` overrides `wrapper.error_mode`
/// - `STMTWRAP_LOG_LEVEL` overrides `logging.level`
/// - `STMTWRAP_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed, or
/// if `STMTWRAP_ERROR_MODE` names no known mode.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with_env(path, |var| std::env::var(var).ok())
}

/// Same as [`load_config`], reading overrides through `env`.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_with_env<F>(path: Option<&str>, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    if let Some(host) = env("STMTWRAP_DB_HOST") {
        config.database.host = host;
    }
    if let Some(user) = env("STMTWRAP_DB_USER") {
        config.database.user = user;
    }
    if let Some(password) = env("STMTWRAP_DB_PASSWORD") {
        config.database.password = password;
    }
    if let Some(name) = env("STMTWRAP_DB_NAME") {
        config.database.database = name;
    }
    if let Some(charset) = env("STMTWRAP_DB_CHARSET") {
        config.database.charset = charset;
    }
    if let Some(mode) = env("STMTWRAP_ERROR_MODE") {
        config.wrapper.error_mode = mode.parse().map_err(|e| ConfigError::InvalidEnv {
            var: "STMTWRAP_ERROR_MODE",
            reason: format!("{e}"),
        })?;
    }
    if let Some(level) = env("STMTWRAP_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = env("STMTWRAP_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}
