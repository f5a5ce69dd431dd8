//! A thin prepared-statement wrapper over a relational database driver.
//!
//! [`StatementWrapper`] owns one connection and at most one open prepared
//! statement. It folds prepare, bind, execute, and fetch into a couple of
//! calls:
//!
//! ```rust,ignore
//! use stmtwrap_db::{params, ConnectOptions, SqliteWrapper, WrapperSettings};
//!
//! let mut db = SqliteWrapper::connect(&ConnectOptions::new("app.db"), WrapperSettings::default())?;
//! let users = db
//!     .query("SELECT id, name FROM users WHERE active = ?", &params![true])?
//!     .fetch_all()?;
//! ```
//!
//! # Design decisions
//!
//! - **Driver seam**: the native engine sits behind the [`Driver`] trait.
//!   SQLite via `rusqlite` ships in this crate; test doubles implement the
//!   same trait.
//! - **Single statement slot**: the open statement lives in an `Option` and
//!   is closed before the next one is prepared, before the connection
//!   closes, and after every fetch.
//! - **Error modes**: failures are returned as [`DbError`] by default.
//!   [`ErrorMode::Abort`] terminates the process on the first failure and
//!   [`ErrorMode::Silent`] logs and swallows it.
//! - **`fetch_row` returns the last row**: it drains the whole result and
//!   keeps the final row, not the first.

mod driver;
mod error;
mod options;
mod params;
mod row;
mod sqlite;
mod wrapper;

pub use driver::{Driver, DriverError, DriverStatement};
pub use error::{DbError, ErrorKind, ErrorMode, ParseErrorModeError};
pub use options::{ConnectOptions, WrapperSettings};
pub use params::{bindings, flatten_params, infer_type, type_string, Binding, Param, ParamArg, TypeTag};
pub use row::{ResultRow, Value};
pub use sqlite::{SqliteDriver, SqliteStatement};
pub use wrapper::{Flow, SqliteWrapper, StatementWrapper};
