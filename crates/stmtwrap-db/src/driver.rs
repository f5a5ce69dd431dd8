//! The seam between the wrapper and a native database driver.
//!
//! A driver owns the live session and hands out statement handles.
//! [`StatementWrapper`](crate::StatementWrapper) never holds more than one
//! handle at a time and always calls [`DriverStatement::close`] before it
//! asks for another.

use std::fmt;

use crate::options::{ConnectOptions, WrapperSettings};
use crate::params::Binding;
use crate::row::Value;

/// A driver-reported failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    /// Native error code, when the driver provides one.
    pub code: Option<i32>,
    /// Human-readable description.
    pub message: String,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for DriverError {}

/// A native database session.
pub trait Driver: Sized {
    /// The prepared statement handle type.
    type Statement: DriverStatement;

    /// Opens a session.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the database cannot be reached or opened.
    fn connect(options: &ConnectOptions, settings: &WrapperSettings) -> Result<Self, DriverError>;

    /// Sets the session character encoding.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the encoding is not supported.
    fn set_charset(&mut self, charset: &str) -> Result<(), DriverError>;

    /// Prepares `sql`, resolving its result metadata.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the SQL text does not compile.
    fn prepare(&mut self, sql: &str) -> Result<Self::Statement, DriverError>;

    /// Binds `bindings` positionally and runs the statement.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` on a parameter count mismatch or any failure
    /// while running the statement.
    fn execute(
        &mut self,
        statement: &mut Self::Statement,
        bindings: &[Binding<'_>],
    ) -> Result<(), DriverError>;

    /// Key generated by the most recent INSERT on this session.
    fn last_insert_id(&self) -> i64;

    /// Closes the session.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the driver reports a failure while closing.
    fn close(self) -> Result<(), DriverError>;
}

/// A prepared statement handle.
pub trait DriverStatement {
    /// Result column names, in order. Empty for statements that return no
    /// rows.
    fn columns(&self) -> &[String];

    /// Returns the next result row, or `None` when exhausted.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the driver fails to produce the row.
    fn fetch(&mut self) -> Result<Option<Vec<Value>>, DriverError>;

    /// Buffers the full result set and returns its total row count.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if buffering fails.
    fn store_result(&mut self) -> Result<u64, DriverError>;

    /// Rows changed by the last execution.
    fn affected_rows(&self) -> u64;

    /// Releases the handle.
    fn close(self);
}
