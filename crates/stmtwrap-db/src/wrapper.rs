//! The statement wrapper: one connection, at most one open statement.

use crate::driver::{Driver, DriverStatement};
use crate::error::{DbError, ErrorMode};
use crate::options::{ConnectOptions, WrapperSettings};
use crate::params::{bindings, flatten_params, type_string, ParamArg};
use crate::row::ResultRow;
use crate::sqlite::SqliteDriver;

/// Returned by a [`fetch_each`](StatementWrapper::fetch_each) callback to
/// continue or stop iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flow {
    #[default]
    Continue,
    Stop,
}

impl From<()> for Flow {
    fn from((): ()) -> Self {
        Self::Continue
    }
}

/// A wrapper over the SQLite driver.
pub type SqliteWrapper = StatementWrapper<SqliteDriver>;

/// Owns one database connection and at most one open prepared statement.
///
/// Opening a statement with [`query`](Self::query) closes whichever
/// statement was open before it. Fetching drains the open statement and
/// closes it, so a statement is single-use for fetching.
///
/// Every failure is routed through the configured [`ErrorMode`].
pub struct StatementWrapper<D: Driver> {
    connection: Option<D>,
    statement: Option<D::Statement>,
    settings: WrapperSettings,
    query_count: u64,
    affected_rows: u64,
    last_insert_id: i64,
}

impl<D: Driver> StatementWrapper<D> {
    /// Opens a connection through `D` and sets the session charset.
    ///
    /// In [`ErrorMode::Silent`] a failed connect yields a wrapper with no
    /// connection; every later `query` on it is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the driver cannot connect or rejects
    /// the charset.
    pub fn connect(options: &ConnectOptions, settings: WrapperSettings) -> Result<Self, DbError> {
        tracing::info!(
            host = %options.host,
            database = %options.database,
            charset = %options.charset,
            mode = %settings.error_mode,
            "opening database connection"
        );

        match D::connect(options, &settings) {
            Ok(driver) => Self::from_driver(driver, options, settings),
            Err(err) => match report(settings.error_mode, DbError::Connection(err)) {
                Some(err) => Err(err),
                None => Ok(Self::detached(settings)),
            },
        }
    }

    /// Wraps an already-open driver and sets the session charset.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the driver rejects the charset.
    pub fn from_driver(
        mut driver: D,
        options: &ConnectOptions,
        settings: WrapperSettings,
    ) -> Result<Self, DbError> {
        if let Err(err) = driver.set_charset(&options.charset) {
            if let Some(err) = report(settings.error_mode, DbError::Connection(err)) {
                if let Err(close_err) = driver.close() {
                    tracing::warn!(error = %close_err, "failed to close rejected connection");
                }
                return Err(err);
            }
        }

        let mut wrapper = Self::detached(settings);
        wrapper.last_insert_id = driver.last_insert_id();
        wrapper.connection = Some(driver);
        Ok(wrapper)
    }

    fn detached(settings: WrapperSettings) -> Self {
        Self {
            connection: None,
            statement: None,
            settings,
            query_count: 0,
            affected_rows: 0,
            last_insert_id: 0,
        }
    }

    /// Prepares `sql`, binds `params` positionally, and executes it.
    ///
    /// Any statement left open by a previous call is closed first. Nested
    /// sequences in `params` are flattened one level before binding. On
    /// success the statement stays open for fetching and the query counter
    /// is incremented; the wrapper is returned for chaining.
    ///
    /// In [`ErrorMode::Silent`] a failure returns the wrapper with no
    /// statement open.
    ///
    /// # Errors
    ///
    /// - `DbError::Syntax` if the statement fails to prepare.
    /// - `DbError::Execution` if it prepares but fails to run, including a
    ///   parameter count mismatch.
    /// - `DbError::ConnectionClosed` after [`close`](Self::close).
    pub fn query(&mut self, sql: &str, params: &[ParamArg]) -> Result<&mut Self, DbError> {
        self.close_statement();

        match self.run(sql, params) {
            Ok(statement) => {
                self.statement = Some(statement);
                self.query_count += 1;
                Ok(self)
            }
            Err(err) => match report(self.settings.error_mode, err) {
                Some(err) => Err(err),
                None => Ok(self),
            },
        }
    }

    fn run(&mut self, sql: &str, params: &[ParamArg]) -> Result<D::Statement, DbError> {
        let conn = self.connection.as_mut().ok_or(DbError::ConnectionClosed)?;

        let mut statement = conn.prepare(sql).map_err(|source| DbError::Syntax {
            sql: sql.to_string(),
            source,
        })?;

        let flat = flatten_params(params);
        let bound = bindings(&flat);
        tracing::debug!(
            sql,
            types = %type_string(&flat),
            query_count = self.query_count + 1,
            "executing prepared statement"
        );

        if let Err(err) = conn.execute(&mut statement, &bound) {
            statement.close();
            return Err(DbError::Execution(err));
        }

        self.affected_rows = statement.affected_rows();
        self.last_insert_id = conn.last_insert_id();
        Ok(statement)
    }

    /// Fetches every row of the open statement, then closes it.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NoOpenStatement` if nothing is open, or
    /// `DbError::Fetch` if the driver fails mid-result.
    pub fn fetch_all(&mut self) -> Result<Vec<ResultRow>, DbError> {
        let mut rows = Vec::new();
        match self.drain(|row| {
            rows.push(row);
            Flow::Continue
        }) {
            Ok(()) => Ok(rows),
            Err(err) => self.recover(err),
        }
    }

    /// Hands each row of the open statement to `callback` without
    /// accumulating them, then closes the statement.
    ///
    /// The callback may return `()` or a [`Flow`]; [`Flow::Stop`] ends the
    /// iteration early. Returns the number of times the callback ran.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_all`](Self::fetch_all).
    pub fn fetch_each<F, R>(&mut self, mut callback: F) -> Result<usize, DbError>
    where
        F: FnMut(ResultRow) -> R,
        R: Into<Flow>,
    {
        let mut calls = 0;
        match self.drain(|row| {
            calls += 1;
            callback(row).into()
        }) {
            Ok(()) => Ok(calls),
            Err(err) => self.recover(err),
        }
    }

    /// Drains the open statement and returns its **last** row, then closes
    /// it.
    ///
    /// For a result of rows `[A, B, C]` this returns `C`, not `A`. Returns
    /// `None` for an empty result.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_all`](Self::fetch_all).
    pub fn fetch_row(&mut self) -> Result<Option<ResultRow>, DbError> {
        let mut last = None;
        match self.drain(|row| {
            last = Some(row);
            Flow::Continue
        }) {
            Ok(()) => Ok(last),
            Err(err) => self.recover(err),
        }
    }

    fn drain<F>(&mut self, mut visit: F) -> Result<(), DbError>
    where
        F: FnMut(ResultRow) -> Flow,
    {
        let statement = self.statement.as_mut().ok_or(DbError::NoOpenStatement)?;
        let columns = statement.columns().to_vec();

        let outcome = loop {
            match statement.fetch() {
                Ok(Some(values)) => {
                    if visit(ResultRow::from_columns(&columns, values)) == Flow::Stop {
                        break Ok(());
                    }
                }
                Ok(None) => break Ok(()),
                Err(err) => break Err(DbError::Fetch(err)),
            }
        };

        self.close_statement();
        outcome
    }

    /// Buffers the open statement's full result and returns its row count.
    ///
    /// The count covers the whole result regardless of rows fetched after
    /// the call.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NoOpenStatement` if nothing is open, or
    /// `DbError::Fetch` if buffering fails.
    pub fn num_rows(&mut self) -> Result<u64, DbError> {
        let counted = match self.statement.as_mut() {
            Some(statement) => statement.store_result().map_err(DbError::Fetch),
            None => Err(DbError::NoOpenStatement),
        };
        counted.or_else(|err| self.recover(err))
    }

    /// Rows changed by the most recent INSERT, UPDATE, or DELETE run through
    /// [`query`](Self::query). Zero after a row-returning statement.
    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    /// Key generated by the most recent INSERT on the connection.
    pub fn last_insert_id(&self) -> i64 {
        self.connection
            .as_ref()
            .map_or(self.last_insert_id, D::last_insert_id)
    }

    /// Number of successful [`query`](Self::query) calls.
    pub fn query_count(&self) -> u64 {
        self.query_count
    }

    /// Result column names of the open statement. Empty when no statement
    /// is open or it returns no rows.
    pub fn columns(&self) -> &[String] {
        match &self.statement {
            Some(statement) => statement.columns(),
            None => &[],
        }
    }

    pub fn has_open_statement(&self) -> bool {
        self.statement.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn error_mode(&self) -> ErrorMode {
        self.settings.error_mode
    }

    pub fn set_error_mode(&mut self, mode: ErrorMode) {
        self.settings.error_mode = mode;
    }

    /// Closes the open statement, if any, then the connection. Closing an
    /// already-closed wrapper does nothing.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Close` if the driver fails to close the connection.
    pub fn close(&mut self) -> Result<(), DbError> {
        self.close_statement();

        let Some(conn) = self.connection.take() else {
            return Ok(());
        };
        self.last_insert_id = conn.last_insert_id();

        tracing::info!(query_count = self.query_count, "closing database connection");
        conn.close()
            .map_err(DbError::Close)
            .or_else(|err| self.recover(err))
    }

    fn close_statement(&mut self) {
        if let Some(statement) = self.statement.take() {
            tracing::trace!("closing open statement");
            statement.close();
        }
    }

    fn recover<T: Default>(&self, err: DbError) -> Result<T, DbError> {
        match report(self.settings.error_mode, err) {
            Some(err) => Err(err),
            None => Ok(T::default()),
        }
    }
}

impl<D: Driver> Drop for StatementWrapper<D> {
    fn drop(&mut self) {
        self.close_statement();
        if let Some(conn) = self.connection.take() {
            if let Err(err) = conn.close() {
                tracing::warn!(error = %err, "failed to close connection on drop");
            }
        }
    }
}

/// Routes an error according to `mode`.
///
/// Returns the error for [`ErrorMode::Propagate`], `None` for
/// [`ErrorMode::Silent`], and never returns for [`ErrorMode::Abort`].
fn report(mode: ErrorMode, err: DbError) -> Option<DbError> {
    match mode {
        ErrorMode::Propagate => Some(err),
        ErrorMode::Silent => {
            tracing::warn!(kind = %err.kind(), error = %err, "suppressed database error");
            None
        }
        ErrorMode::Abort => {
            let message = err.labelled();
            tracing::error!(kind = %err.kind(), error = %err, "aborting on database error");
            eprintln!("{message}");
            std::process::exit(1)
        }
    }
}
