//! Command-line front end for `stmtwrap-db`.
//!
//! Runs one parameterised statement through a
//! [`SqliteWrapper`](stmtwrap_db::SqliteWrapper) and prints the outcome as
//! JSON lines on stdout. Logs go to stderr.

pub mod args;
pub mod config;

use std::io::Write;

use serde_json::json;
use stmtwrap_db::{DbError, Flow, SqliteWrapper};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::args::Invocation;
use crate::config::{Config, LoggingConfig};

/// Errors from a single CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    /// The wrapper reported a failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Writing output failed.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding a row failed.
    #[error("failed to encode row: {0}")]
    Json(#[from] serde_json::Error),
}

/// Installs the global tracing subscriber, writing to stderr.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("warn"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Connects, runs the invocation's statement, and writes the outcome to
/// `out`.
///
/// Row-returning statements print one JSON object per row, or
/// `{"num_rows":N}` with `--num-rows`. Other statements print
/// `{"affected_rows":N,"last_insert_id":M}`. When the wrapper is in silent
/// mode and the statement failed, nothing is printed.
///
/// # Errors
///
/// Returns `CliError` if the wrapper reports a failure or output cannot be
/// written.
pub fn run<W: Write>(config: &Config, invocation: &Invocation, out: &mut W) -> Result<(), CliError> {
    let mut db = SqliteWrapper::connect(&config.database, config.wrapper)?;
    db.query(&invocation.sql, &invocation.params)?;

    if !db.has_open_statement() {
        tracing::warn!(sql = %invocation.sql, "statement produced no result");
    } else if db.columns().is_empty() {
        writeln!(
            out,
            "{}",
            json!({
                "affected_rows": db.affected_rows(),
                "last_insert_id": db.last_insert_id(),
            })
        )?;
    } else if invocation.num_rows {
        let count = db.num_rows()?;
        writeln!(out, "{}", json!({ "num_rows": count }))?;
    } else {
        write_rows(&mut db, out)?;
    }

    db.close()?;
    Ok(())
}

fn write_rows<W: Write>(db: &mut SqliteWrapper, out: &mut W) -> Result<(), CliError> {
    let mut failure = None;
    db.fetch_each(|row| {
        let written = serde_json::to_writer(&mut *out, &row)
            .map_err(CliError::from)
            .and_then(|()| writeln!(out).map_err(CliError::from));
        match written {
            Ok(()) => Flow::Continue,
            Err(err) => {
                failure = Some(err);
                Flow::Stop
            }
        }
    })?;

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
