//! Error types and the error reporting mode.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::driver::DriverError;

/// Errors surfaced by [`StatementWrapper`](crate::StatementWrapper).
#[derive(Debug, Error)]
pub enum DbError {
    /// The driver could not open the connection or set the session charset.
    #[error("Failed to connect to database - {0}")]
    Connection(#[source] DriverError),

    /// The statement failed to prepare.
    #[error("Unable to prepare statement (check your syntax) - {source}")]
    Syntax {
        /// The SQL text that failed to prepare.
        sql: String,
        /// The underlying driver error.
        source: DriverError,
    },

    /// The statement prepared but failed to run.
    #[error("Unable to process query (check your params) - {0}")]
    Execution(#[source] DriverError),

    /// Reading rows from an executed statement failed.
    #[error("Unable to fetch result rows - {0}")]
    Fetch(#[source] DriverError),

    /// The connection failed to close cleanly.
    #[error("Unable to close connection - {0}")]
    Close(#[source] DriverError),

    /// A fetch or count was requested with no statement open.
    #[error("no open statement; call query() first")]
    NoOpenStatement,

    /// The wrapper has already been closed.
    #[error("connection is closed")]
    ConnectionClosed,
}

/// Coarse classification of a [`DbError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connecting or setting the charset failed.
    Connection,
    /// Preparing the statement failed.
    Syntax,
    /// Binding or running the statement failed.
    Execution,
    /// Reading rows failed.
    Fetch,
    /// Closing the connection failed.
    Close,
    /// The wrapper was used out of order, e.g. a fetch with nothing open.
    Usage,
}

impl ErrorKind {
    /// Returns the label used to prefix reported messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Connection => "ConnectionError",
            Self::Syntax => "SyntaxError",
            Self::Execution => "ExecutionError",
            Self::Fetch => "FetchError",
            Self::Close => "CloseError",
            Self::Usage => "UsageError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl DbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) => ErrorKind::Connection,
            Self::Syntax { .. } => ErrorKind::Syntax,
            Self::Execution(_) => ErrorKind::Execution,
            Self::Fetch(_) => ErrorKind::Fetch,
            Self::Close(_) => ErrorKind::Close,
            Self::NoOpenStatement | Self::ConnectionClosed => ErrorKind::Usage,
        }
    }

    /// The message prefixed with its label, e.g. `SyntaxError: Unable to ...`.
    pub fn labelled(&self) -> String {
        format!("{}: {}", self.kind().label(), self)
    }
}

/// How the wrapper surfaces errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Return the error to the caller.
    #[default]
    Propagate,
    /// Report the error and terminate the process with status 1.
    Abort,
    /// Log the error and return a neutral value.
    Silent,
}

impl ErrorMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Propagate => "propagate",
            Self::Abort => "abort",
            Self::Silent => "silent",
        }
    }
}

impl fmt::Display for ErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name an [`ErrorMode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown error mode '{0}' (expected propagate, abort, or silent)")]
pub struct ParseErrorModeError(pub String);

impl FromStr for ErrorMode {
    type Err = ParseErrorModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "propagate" => Ok(Self::Propagate),
            "abort" => Ok(Self::Abort),
            "silent" => Ok(Self::Silent),
            _ => Err(ParseErrorModeError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_labels() {
        let err = DbError::Syntax {
            sql: "SELEC 1".to_string(),
            source: DriverError::new("near \"SELEC\": syntax error"),
        };
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_eq!(
            err.labelled(),
            "SyntaxError: Unable to prepare statement (check your syntax) - near \"SELEC\": syntax error"
        );
        assert_eq!(
            DbError::NoOpenStatement.kind().label(),
            "UsageError"
        );
    }

    #[test]
    fn error_mode_parses_case_insensitively() {
        assert_eq!("Abort".parse::<ErrorMode>(), Ok(ErrorMode::Abort));
        assert_eq!(" silent ".parse::<ErrorMode>(), Ok(ErrorMode::Silent));
        assert_eq!("propagate".parse::<ErrorMode>(), Ok(ErrorMode::Propagate));
        assert!("halt".parse::<ErrorMode>().is_err());
    }
}
