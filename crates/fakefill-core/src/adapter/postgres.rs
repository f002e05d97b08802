//! PostgreSQL adapter (sqlx).

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::adapter::{
    batch_error, build_insert_sql, connection_error, not_connected, query_error,
    rows_per_statement, DatabaseAdapter,
};
use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::generate::value::{Row, Value};
use crate::schema::types::{Column, ColumnType, Dialect, FieldType, TableIdent};

pub struct PostgresAdapter {
    config: DatabaseConfig,
    pool: Option<PgPool>,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PostgresAdapter {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: None,
            tx: None,
        }
    }

    fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&self.config.host)
            .database(&self.config.database);
        if let Some(port) = self.config.effective_port() {
            options = options.port(port);
        }
        if !self.config.user.is_empty() {
            options = options.username(&self.config.user);
        }
        if !self.config.password.is_empty() {
            options = options.password(&self.config.password);
        }
        options
    }

    async fn begin(&mut self) -> Result<&mut Transaction<'static, Postgres>> {
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
                tracing::warn!(error = %e, "PostgreSQL rollback failed");
            }
        }
    }
}

#[async_trait]
impl DatabaseAdapter for PostgresAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::PostgreSQL
    }

    fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    async fn connect(&mut self) -> Result<()> {
        if self.pool.is_some() {
            return Ok(());
        }
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(self.connect_options())
            .await
            .map_err(|e| connection_error(&self.config, "Failed to connect to PostgreSQL", e))?;
        tracing::debug!(hint = %self.config.connection_hint(), "Connected to PostgreSQL");
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
        let per_statement = rows_per_statement(Dialect::PostgreSQL, columns.len());
        let tx = self.begin().await?;

        let mut failure = None;
        for chunk in rows.chunks(per_statement) {
            let sql = build_insert_sql(Dialect::PostgreSQL, table, columns, chunk.len());
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
            tracing::debug!("PostgreSQL connection closed");
        }
        Ok(())
    }
}

/// Bind one value; NULLs take the column's type so PostgreSQL can infer it.
fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q Value,
    column_type: &ColumnType,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => match column_type {
            ColumnType::Identifier => query.bind(None::<Uuid>),
            ColumnType::Field(field_type) => match field_type {
                FieldType::Int => query.bind(None::<i32>),
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
        Value::Uuid(u) => query.bind(*u),
    }
}
