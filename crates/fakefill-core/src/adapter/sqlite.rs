//! SQLite adapter (sqlx).
//!
//! `database` is a file path, created when missing, or `:memory:`. The only
//! schema available without `ATTACH` is `main`.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};

use crate::adapter::{
    batch_error, build_insert_sql, connection_error, not_connected, query_error,
    rows_per_statement, DatabaseAdapter,
};
use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::generate::value::{Row, Value};
use crate::schema::types::{Column, ColumnType, Dialect, FieldType, TableIdent};

pub struct SqliteAdapter {
    config: DatabaseConfig,
    pool: Option<SqlitePool>,
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteAdapter {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: None,
            tx: None,
        }
    }

    fn connect_options(&self) -> std::result::Result<SqliteConnectOptions, sqlx::Error> {
        if self.config.database == ":memory:" {
            return SqliteConnectOptions::from_str("sqlite::memory:");
        }
        Ok(SqliteConnectOptions::new()
            .filename(&self.config.database)
            .create_if_missing(true))
    }

    async fn begin(&mut self) -> Result<&mut Transaction<'static, Sqlite>> {
        let pool = self.pool.as_ref().ok_or_else(|| not_connected(&self.config))?;
        if self.tx.is_none() {
            let tx = pool.begin().await.map_err(|e| query_error("BEGIN", e))?;
            self.tx = Some(tx);
        }
        self.tx.as_mut().ok_or_else(|| not_connected(&self.config))
    }

    async fn rollback(&mut self) {
        if let Some(tx) = self.tx.take() {
            if let Err(e) = tx.rollback().await {
                tracing::warn!(error = %e, "SQLite rollback failed");
            }
        }
    }
}

#[async_trait]
impl DatabaseAdapter for SqliteAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::SQLite
    }

    fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    async fn connect(&mut self) -> Result<()> {
        if self.pool.is_some() {
            return Ok(());
        }
        let options = self
            .connect_options()
            .map_err(|e| connection_error(&self.config, "Invalid SQLite database path", e))?;
        // One connection that never idles out, or an in-memory database vanishes.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| connection_error(&self.config, "Failed to open SQLite database", e))?;
        tracing::debug!(database = %self.config.database, "Opened SQLite database");
        self.pool = Some(pool);
        Ok(())
    }

    async fn execute_statement(&mut self, sql: &str) -> Result<()> {
        let tx = self.begin().await?;
        tracing::debug!(sql, "Executing statement");
        let result = sqlx::query(sql).execute(&mut **tx).await;
        match result {
            Ok(_) => self.commit().await,
            Err(e) => {
                self.rollback().await;
                Err(query_error(sql, e))
            }
        }
    }

    async fn insert_rows_batch(
        &mut self,
        table: &TableIdent,
        columns: &[Column],
        rows: Vec<Row>,
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let per_statement = rows_per_statement(Dialect::SQLite, columns.len());
        let tx = self.begin().await?;

        let mut failure = None;
        for chunk in rows.chunks(per_statement) {
            let sql = build_insert_sql(Dialect::SQLite, table, columns, chunk.len());
            let mut query = sqlx::query(&sql);
            for row in chunk {
                for (value, column) in row.iter().zip(columns) {
                    query = bind_value(query, value, &column.column_type);
                }
            }
            if let Err(e) = query.execute(&mut **tx).await {
                failure = Some(batch_error(table, rows.len(), &sql, e));
                break;
            }
        }

        match failure {
            None => self.commit().await,
            Some(err) => {
                self.rollback().await;
                Err(err)
            }
        }
    }

    async fn commit(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await.map_err(|e| query_error("COMMIT", e))?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.rollback().await;
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            tracing::debug!("SQLite database closed");
        }
        Ok(())
    }
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q Value,
    column_type: &ColumnType,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => match column_type {
            ColumnType::Identifier => query.bind(None::<String>),
            ColumnType::Field(field_type) => match field_type {
                FieldType::Int => query.bind(None::<i64>),
                FieldType::Float => query.bind(None::<f64>),
                FieldType::Date => query.bind(None::<NaiveDate>),
                FieldType::Datetime => query.bind(None::<NaiveDateTime>),
                FieldType::Boolean => query.bind(None::<bool>),
                FieldType::Varchar | FieldType::Text | FieldType::Other(_) => {
                    query.bind(None::<String>)
                }
            },
        },
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::String(s) => query.bind(s.as_ref()),
        Value::Date(d) => query.bind(*d),
        Value::Timestamp(ts) => query.bind(*ts),
        // Hyphenated text, matching the TEXT identifier column.
        Value::Uuid(u) => query.bind(u.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FakeFillError;
    use std::borrow::Cow;

    fn config_for(path: &std::path::Path) -> DatabaseConfig {
        DatabaseConfig::from_url(&format!("sqlite://{}", path.display())).unwrap()
    }

    fn name_column() -> Vec<Column> {
        vec![Column {
            name: "name".to_string(),
            column_type: ColumnType::Field(FieldType::Varchar),
        }]
    }

    #[tokio::test]
    async fn test_statement_before_connect_fails() {
        let mut adapter = SqliteAdapter::new(DatabaseConfig::from_url("sqlite::memory:").unwrap());
        let err = adapter.execute_statement("SELECT 1").await.unwrap_err();
        assert!(matches!(err, FakeFillError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_failing_statement_is_query_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut adapter = SqliteAdapter::new(config_for(&dir.path().join("t.db")));
        adapter.connect().await.unwrap();

        let err = adapter.execute_statement("CREATE TABLE (").await.unwrap_err();
        assert!(matches!(err, FakeFillError::Query { .. }));

        // The adapter stays usable after a failed statement
        adapter
            .execute_statement("CREATE TABLE ok (name TEXT)")
            .await
            .unwrap();
        adapter.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut adapter = SqliteAdapter::new(DatabaseConfig::from_url("sqlite::memory:").unwrap());
        adapter.connect().await.unwrap();
        adapter.close().await.unwrap();
        adapter.close().await.unwrap();
        assert!(!adapter.is_connected());
    }

    #[tokio::test]
    async fn test_commit_without_transaction_is_noop() {
        let mut adapter = SqliteAdapter::new(DatabaseConfig::from_url("sqlite::memory:").unwrap());
        adapter.connect().await.unwrap();
        adapter.commit().await.unwrap();
        adapter.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_batch_rows_visible_after_insert() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.db");
        let mut adapter = SqliteAdapter::new(config_for(&path));
        adapter.connect().await.unwrap();
        adapter
            .execute_statement("CREATE TABLE main.people (name TEXT NULL)")
            .await
            .unwrap();

        let rows = vec![
            vec![Value::String(Cow::Borrowed("Ana"))],
            vec![Value::Null],
            vec![Value::String(Cow::Borrowed("Bruno"))],
        ];
        let table = TableIdent::new("main", "people");
        adapter
            .insert_rows_batch(&table, &name_column(), rows)
            .await
            .unwrap();

        let pool = adapter.pool.as_ref().unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM people")
            .fetch_one(pool)
            .await
            .unwrap();
        let (nulls,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM people WHERE name IS NULL")
            .fetch_one(pool)
            .await
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(nulls, 1);
        adapter.close().await.unwrap();
    }
}
