//! Connection parameters and wrapper runtime settings.

use serde::Deserialize;

use crate::error::ErrorMode;

/// Parameters used to open the underlying connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectOptions {
    /// Database host. The SQLite driver ignores it.
    #[serde(default = "default_host")]
    pub host: String,

    /// User name. The SQLite driver ignores it.
    #[serde(default)]
    pub user: String,

    /// Password. The SQLite driver ignores it.
    #[serde(default)]
    pub password: String,

    /// Database name. For SQLite this is the file path, or `:memory:`.
    #[serde(default)]
    pub database: String,

    /// Session character encoding.
    #[serde(default = "default_charset")]
    pub charset: String,
}

impl ConnectOptions {
    /// Options for `database` with every other field at its default.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            host: default_host(),
            user: String::new(),
            password: String::new(),
            database: String::new(),
            charset: default_charset(),
        }
    }
}

/// Runtime tunables for the wrapper and its driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WrapperSettings {
    /// How driver errors are surfaced.
    #[serde(default)]
    pub error_mode: ErrorMode,

    /// Busy timeout for the connection, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Capacity of the driver's prepared-statement cache.
    #[serde(default = "default_statement_cache_capacity")]
    pub statement_cache_capacity: usize,
}

impl Default for WrapperSettings {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::default(),
            busy_timeout_ms: default_busy_timeout_ms(),
            statement_cache_capacity: default_statement_cache_capacity(),
        }
    }
}

impl WrapperSettings {
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_charset() -> String {
    "utf8".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_statement_cache_capacity() -> usize {
    16
}
