//! # Database Adapters
//!
//! A uniform capability set over the three supported databases:
//!
//! - **PostgreSQL** via sqlx, `$n` placeholders
//! - **SQLite** via sqlx, `?` placeholders
//! - **SQL Server** via tiberius, `@Pn` placeholders
//!
//! Every statement runs inside a transaction that is committed when the
//! statement (or the whole batch) succeeds and rolled back otherwise, so a
//! failed call never leaves partial rows behind. Calls are strictly
//! sequential; an adapter owns exactly one connection.

pub mod postgres;
pub mod sqlite;
pub mod sqlserver;

use std::ops::{Deref, DerefMut};

use async_trait::async_trait;

use crate::config::DatabaseConfig;
use crate::error::{truncate_sql, BoxError, FakeFillError, Result};
use crate::generate::value::Row;
use crate::schema::types::{Column, Dialect, TableIdent};

pub use postgres::PostgresAdapter;
pub use sqlite::SqliteAdapter;
pub use sqlserver::SqlServerAdapter;

/// Longest SQL snippet carried in error messages.
pub(crate) const SQL_PREVIEW_LEN: usize = 200;

/// Session-level operations every backend provides.
#[async_trait]
pub trait DatabaseAdapter: Send {
    fn dialect(&self) -> Dialect;

    fn is_connected(&self) -> bool;

    /// Open the connection. Calling it on a connected adapter is a no-op.
    async fn connect(&mut self) -> Result<()>;

    /// Run one DDL/DML statement and commit it.
    async fn execute_statement(&mut self, sql: &str) -> Result<()>;

    /// Insert `rows` (positional, matching `columns`) in one transaction.
    ///
    /// The batch is split into several statements when it would exceed the
    /// dialect's parameter or row limits. Either every row lands or none do.
    async fn insert_rows_batch(
        &mut self,
        table: &TableIdent,
        columns: &[Column],
        rows: Vec<Row>,
    ) -> Result<()>;

    /// Commit a pending transaction, if any.
    async fn commit(&mut self) -> Result<()>;

    /// Roll back anything uncommitted and release the connection. Idempotent.
    async fn close(&mut self) -> Result<()>;
}

/// Adapter for whichever dialect the configuration names.
pub enum AnyAdapter {
    Postgres(PostgresAdapter),
    Sqlite(SqliteAdapter),
    SqlServer(SqlServerAdapter),
}

impl AnyAdapter {
    /// Pick the adapter for `config.db`. Does not connect.
    pub fn for_config(config: &DatabaseConfig) -> Result<Self> {
        Ok(match config.dialect()? {
            Dialect::PostgreSQL => AnyAdapter::Postgres(PostgresAdapter::new(config.clone())),
            Dialect::SQLite => AnyAdapter::Sqlite(SqliteAdapter::new(config.clone())),
            Dialect::SqlServer => AnyAdapter::SqlServer(SqlServerAdapter::new(config.clone())),
        })
    }
}

#[async_trait]
impl DatabaseAdapter for AnyAdapter {
    fn dialect(&self) -> Dialect {
        match self {
            AnyAdapter::Postgres(a) => a.dialect(),
            AnyAdapter::Sqlite(a) => a.dialect(),
            AnyAdapter::SqlServer(a) => a.dialect(),
        }
    }

    fn is_connected(&self) -> bool {
        match self {
            AnyAdapter::Postgres(a) => a.is_connected(),
            AnyAdapter::Sqlite(a) => a.is_connected(),
            AnyAdapter::SqlServer(a) => a.is_connected(),
        }
    }

    async fn connect(&mut self) -> Result<()> {
        match self {
            AnyAdapter::Postgres(a) => a.connect().await,
            AnyAdapter::Sqlite(a) => a.connect().await,
            AnyAdapter::SqlServer(a) => a.connect().await,
        }
    }

    async fn execute_statement(&mut self, sql: &str) -> Result<()> {
        match self {
            AnyAdapter::Postgres(a) => a.execute_statement(sql).await,
            AnyAdapter::Sqlite(a) => a.execute_statement(sql).await,
            AnyAdapter::SqlServer(a) => a.execute_statement(sql).await,
        }
    }

    async fn insert_rows_batch(
        &mut self,
        table: &TableIdent,
        columns: &[Column],
        rows: Vec<Row>,
    ) -> Result<()> {
        match self {
            AnyAdapter::Postgres(a) => a.insert_rows_batch(table, columns, rows).await,
            AnyAdapter::Sqlite(a) => a.insert_rows_batch(table, columns, rows).await,
            AnyAdapter::SqlServer(a) => a.insert_rows_batch(table, columns, rows).await,
        }
    }

    async fn commit(&mut self) -> Result<()> {
        match self {
            AnyAdapter::Postgres(a) => a.commit().await,
            AnyAdapter::Sqlite(a) => a.commit().await,
            AnyAdapter::SqlServer(a) => a.commit().await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            AnyAdapter::Postgres(a) => a.close().await,
            AnyAdapter::Sqlite(a) => a.close().await,
            AnyAdapter::SqlServer(a) => a.close().await,
        }
    }
}

/// A connected adapter borrowed for the length of one run.
///
/// Obtain with [`Session::open`] and finish with [`Session::close`]. A
/// session dropped without `close` logs a warning; the connection itself is
/// released when the adapter is dropped.
pub struct Session<'a, A: DatabaseAdapter> {
    adapter: &'a mut A,
    closed: bool,
}

impl<'a, A: DatabaseAdapter> Session<'a, A> {
    /// Connect the adapter if needed and wrap it.
    pub async fn open(adapter: &'a mut A) -> Result<Self> {
        if !adapter.is_connected() {
            adapter.connect().await?;
        }
        Ok(Self {
            adapter,
            closed: false,
        })
    }

    /// Release the connection, rolling back anything uncommitted.
    pub async fn close(mut self) -> Result<()> {
        self.closed = true;
        self.adapter.close().await
    }
}

impl<A: DatabaseAdapter> Deref for Session<'_, A> {
    type Target = A;

    fn deref(&self) -> &A {
        self.adapter
    }
}

impl<A: DatabaseAdapter> DerefMut for Session<'_, A> {
    fn deref_mut(&mut self) -> &mut A {
        self.adapter
    }
}

impl<A: DatabaseAdapter> Drop for Session<'_, A> {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(
                dialect = %self.adapter.dialect(),
                "Database session dropped without close()"
            );
        }
    }
}

/// Build a parameterized multi-row INSERT for `row_count` rows.
///
/// Placeholders are numbered globally across rows, 1-based.
pub fn build_insert_sql(
    dialect: Dialect,
    table: &TableIdent,
    columns: &[Column],
    row_count: usize,
) -> String {
    let col_list = columns
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!("INSERT INTO {} ({}) VALUES ", table.qualified(), col_list);
    let mut index = 1;
    for row in 0..row_count {
        if row > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        for col in 0..columns.len() {
            if col > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&dialect.placeholder(index));
            index += 1;
        }
        sql.push(')');
    }
    sql
}

/// Rows that fit in one INSERT statement for `column_count` columns.
pub fn rows_per_statement(dialect: Dialect, column_count: usize) -> usize {
    let by_params = dialect.max_bind_params() / column_count.max(1);
    by_params.min(dialect.max_rows_per_statement()).max(1)
}

pub(crate) fn not_connected(config: &DatabaseConfig) -> FakeFillError {
    FakeFillError::Connection {
        message: "Adapter is not connected".to_string(),
        connection_hint: config.connection_hint(),
        source: "connect() was not called or the session was closed".into(),
    }
}

pub(crate) fn connection_error(
    config: &DatabaseConfig,
    message: &str,
    source: impl Into<BoxError>,
) -> FakeFillError {
    FakeFillError::Connection {
        message: message.to_string(),
        connection_hint: config.connection_hint(),
        source: source.into(),
    }
}

pub(crate) fn query_error(sql: &str, source: impl Into<BoxError>) -> FakeFillError {
    FakeFillError::Query {
        sql_preview: truncate_sql(sql, SQL_PREVIEW_LEN),
        source: source.into(),
    }
}

/// Batch failure; `row_offset` is relative to the batch until the caller
/// shifts it by the rows already inserted.
pub(crate) fn batch_error(
    table: &TableIdent,
    rows: usize,
    sql: &str,
    source: impl Into<BoxError>,
) -> FakeFillError {
    FakeFillError::BatchInsert {
        table: table.qualified(),
        rows,
        row_offset: 0,
        sql_preview: truncate_sql(sql, SQL_PREVIEW_LEN),
        source: source.into(),
    }
}
