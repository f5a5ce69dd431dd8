//! SQLite driver backed by `rusqlite`.
//!
//! Statements are compiled through the connection's prepared-statement
//! cache. Row-returning statements are buffered in full at execute time, so
//! execution errors surface from [`Driver::execute`] and
//! [`DriverStatement::store_result`] is a count of the buffer.

use std::collections::VecDeque;
use std::time::Duration;

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Batch, Connection, OpenFlags};

use crate::driver::{Driver, DriverError, DriverStatement};
use crate::options::{ConnectOptions, WrapperSettings};
use crate::params::{Binding, Param};
use crate::row::Value;

/// A single SQLite connection.
pub struct SqliteDriver {
    conn: Connection,
}

impl SqliteDriver {
    /// Borrows the underlying `rusqlite` connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// A prepared SQLite statement and its buffered result.
#[derive(Debug)]
pub struct SqliteStatement {
    sql: String,
    columns: Vec<String>,
    param_count: usize,
    rows: VecDeque<Vec<Value>>,
    total_rows: u64,
    affected_rows: u64,
}

impl Driver for SqliteDriver {
    type Statement = SqliteStatement;

    fn connect(options: &ConnectOptions, settings: &WrapperSettings) -> Result<Self, DriverError> {
        if options.database.is_empty() {
            return Err(DriverError::new("no database path given"));
        }

        tracing::debug!(
            host = %options.host,
            user = %options.user,
            "sqlite driver ignores host and credentials"
        );

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

        let conn = Connection::open_with_flags(&options.database, flags)?;
        conn.busy_timeout(Duration::from_millis(settings.busy_timeout_ms))?;
        conn.set_prepared_statement_cache_capacity(settings.statement_cache_capacity);

        Ok(Self { conn })
    }

    fn set_charset(&mut self, charset: &str) -> Result<(), DriverError> {
        let encoding = sqlite_encoding(charset)
            .ok_or_else(|| DriverError::new(format!("unsupported character set '{charset}'")))?;
        // Only takes effect before the database file is first written.
        self.conn
            .execute_batch(&format!("PRAGMA encoding = '{encoding}';"))?;
        Ok(())
    }

    fn prepare(&mut self, sql: &str) -> Result<SqliteStatement, DriverError> {
        ensure_single_statement(&self.conn, sql)?;

        let stmt = self.conn.prepare_cached(sql)?;
        let columns = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        Ok(SqliteStatement {
            sql: sql.to_string(),
            columns,
            param_count: stmt.parameter_count(),
            rows: VecDeque::new(),
            total_rows: 0,
            affected_rows: 0,
        })
    }

    fn execute(
        &mut self,
        statement: &mut SqliteStatement,
        bindings: &[Binding<'_>],
    ) -> Result<(), DriverError> {
        if bindings.len() != statement.param_count {
            return Err(DriverError::new(format!(
                "wrong number of parameters: statement expects {}, got {}",
                statement.param_count,
                bindings.len()
            )));
        }

        let mut stmt = self.conn.prepare_cached(&statement.sql)?;
        let values = params_from_iter(bindings.iter().map(|binding| binding.value));
        statement.rows.clear();

        if statement.columns.is_empty() {
            let changed = stmt.execute(values)?;
            statement.affected_rows = changed as u64;
            statement.total_rows = 0;
        } else {
            let width = statement.columns.len();
            let mut rows = stmt.query(values)?;
            while let Some(row) = rows.next()? {
                let mut record = Vec::with_capacity(width);
                for i in 0..width {
                    record.push(value_from_ref(row.get_ref(i)?));
                }
                statement.rows.push_back(record);
            }
            drop(rows);
            statement.total_rows = statement.rows.len() as u64;
            // INSERT/UPDATE/DELETE ... RETURNING also lands here.
            statement.affected_rows = if stmt.readonly() { 0 } else { self.conn.changes() };
        }

        Ok(())
    }

    fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    fn close(self) -> Result<(), DriverError> {
        self.conn.close().map_err(|(_, err)| DriverError::from(err))
    }
}

impl DriverStatement for SqliteStatement {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn fetch(&mut self) -> Result<Option<Vec<Value>>, DriverError> {
        Ok(self.rows.pop_front())
    }

    fn store_result(&mut self) -> Result<u64, DriverError> {
        Ok(self.total_rows)
    }

    fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    fn close(self) {}
}

/// Fails unless `sql` holds exactly one statement. Trailing whitespace,
/// comments and semicolons are allowed.
fn ensure_single_statement(conn: &Connection, sql: &str) -> Result<(), DriverError> {
    let mut batch = Batch::new(conn, sql);
    if batch.next()?.is_none() {
        return Err(DriverError::new("empty statement"));
    }
    match batch.next() {
        Ok(None) => Ok(()),
        Ok(Some(_)) | Err(_) => Err(DriverError::new(
            "multiple statements in one query; run them one at a time",
        )),
    }
}

/// Maps a client charset name to a SQLite text encoding.
fn sqlite_encoding(charset: &str) -> Option<&'static str> {
    match charset.trim().to_ascii_lowercase().as_str() {
        "utf8" | "utf8mb4" | "utf-8" => Some("UTF-8"),
        "utf16" | "utf-16" => Some("UTF-16"),
        _ => None,
    }
}

fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(s) => Value::Text(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as Owned;

        Ok(match self {
            Param::Null => ToSqlOutput::Owned(Owned::Null),
            Param::Bool(b) => ToSqlOutput::Owned(Owned::Integer(i64::from(*b))),
            Param::Integer(i) => ToSqlOutput::Owned(Owned::Integer(*i)),
            Param::Float(f) => ToSqlOutput::Owned(Owned::Real(*f)),
            Param::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Param::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl From<rusqlite::Error> for DriverError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, Some(message)) => {
                DriverError::with_code(code.extended_code, message.clone())
            }
            rusqlite::Error::SqliteFailure(code, None) => {
                DriverError::with_code(code.extended_code, code.to_string())
            }
            rusqlite::Error::SqlInputError { error, msg, .. } => {
                DriverError::with_code(error.extended_code, msg.clone())
            }
            other => DriverError::new(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_memory() -> SqliteDriver {
        SqliteDriver::connect(&ConnectOptions::new(":memory:"), &WrapperSettings::default())
            .expect("should open in-memory db")
    }

    #[test]
    fn charset_names_map_to_encodings() {
        assert_eq!(sqlite_encoding("utf8"), Some("UTF-8"));
        assert_eq!(sqlite_encoding("UTF8MB4"), Some("UTF-8"));
        assert_eq!(sqlite_encoding("utf-16"), Some("UTF-16"));
        assert_eq!(sqlite_encoding("latin1"), None);
    }

    #[test]
    fn connect_applies_busy_timeout() {
        let settings = WrapperSettings {
            busy_timeout_ms: 2_500,
            ..WrapperSettings::default()
        };
        let driver = SqliteDriver::connect(&ConnectOptions::new(":memory:"), &settings)
            .expect("should open in-memory db");
        let busy_timeout: i64 = driver
            .connection()
            .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
            .expect("should query busy_timeout");
        assert_eq!(busy_timeout, 2_500);
    }

    #[test]
    fn empty_database_path_is_rejected() {
        let err = SqliteDriver::connect(&ConnectOptions::default(), &WrapperSettings::default())
            .err()
            .expect("empty path should fail");
        assert!(err.message.contains("no database path"));
    }

    #[test]
    fn prepare_captures_columns_and_placeholders() {
        let mut driver = open_memory();
        let stmt = driver
            .prepare("SELECT ?1 AS first, ?2 AS second")
            .expect("should prepare");
        assert_eq!(stmt.columns(), ["first".to_string(), "second".to_string()]);
        assert_eq!(stmt.param_count, 2);
    }

    #[test]
    fn prepare_reports_native_code_on_syntax_error() {
        let mut driver = open_memory();
        let err = driver.prepare("SELEC 1").expect_err("should fail to prepare");
        assert!(err.code.is_some());
        assert!(err.message.contains("syntax error"), "got: {err}");
    }

    #[test]
    fn prepare_rejects_trailing_statements() {
        let mut driver = open_memory();
        let err = driver
            .prepare("CREATE TABLE a (x); CREATE TABLE b (y)")
            .expect_err("two statements should fail");
        assert!(err.message.contains("multiple statements"), "got: {err}");

        let tables: i64 = driver
            .connection()
            .query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get(0))
            .expect("should count tables");
        assert_eq!(tables, 0);
    }

    #[test]
    fn prepare_allows_trailing_semicolon_and_comment() {
        let mut driver = open_memory();
        driver
            .prepare("SELECT 1; -- done")
            .expect("single statement with trailer should prepare");
        let err = driver.prepare("  -- nothing  ").expect_err("blank sql should fail");
        assert!(err.message.contains("empty statement"));
    }

    #[test]
    fn execute_rejects_parameter_count_mismatch() {
        let mut driver = open_memory();
        let mut stmt = driver.prepare("SELECT ?, ?").expect("should prepare");
        let one = Param::Integer(1);
        let err = driver
            .execute(
                &mut stmt,
                &[Binding {
                    tag: crate::params::infer_type(&one),
                    value: &one,
                }],
            )
            .expect_err("count mismatch should fail");
        assert!(err.message.contains("expects 2, got 1"));
    }

    #[test]
    fn bool_binds_as_integer() {
        let mut driver = open_memory();
        let mut stmt = driver.prepare("SELECT ? AS flag").expect("should prepare");
        let flag = Param::Bool(true);
        driver
            .execute(
                &mut stmt,
                &[Binding {
                    tag: crate::params::infer_type(&flag),
                    value: &flag,
                }],
            )
            .expect("should execute");
        assert_eq!(stmt.store_result().expect("should count"), 1);
        assert_eq!(
            stmt.fetch().expect("should fetch"),
            Some(vec![Value::Integer(1)])
        );
        assert_eq!(stmt.fetch().expect("should fetch"), None);
    }
}
