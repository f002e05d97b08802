//! SQL Server adapter (tiberius over a tokio TCP stream).
//!
//! tiberius has no transaction object, so transactions are driven with
//! explicit `BEGIN TRANSACTION` / `COMMIT` / `ROLLBACK` batches.

use std::borrow::Cow;

use async_trait::async_trait;
use tiberius::{AuthMethod, Client, ColumnData, Config, IntoSql, Query};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::adapter::{
    batch_error, build_insert_sql, connection_error, not_connected, query_error,
    rows_per_statement, DatabaseAdapter,
};
use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::generate::value::{Row, Value};
use crate::schema::types::{Column, ColumnType, Dialect, FieldType, TableIdent};

type SqlServerClient = Client<Compat<TcpStream>>;

pub struct SqlServerAdapter {
    config: DatabaseConfig,
    client: Option<SqlServerClient>,
    in_transaction: bool,
}

impl SqlServerAdapter {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            client: None,
            in_transaction: false,
        }
    }

    fn tiberius_config(&self) -> Config {
        let mut config = Config::new();
        config.host(&self.config.host);
        config.port(
            self.config
                .effective_port()
                .unwrap_or(Dialect::SqlServer.default_port().unwrap_or(1433)),
        );
        config.database(&self.config.database);
        config.authentication(AuthMethod::sql_server(
            &self.config.user,
            &self.config.password,
        ));
        if self.config.trust_server_certificate {
            config.trust_cert();
        }
        config
    }

    fn client(&mut self) -> Result<&mut SqlServerClient> {
        match self.client.as_mut() {
            Some(client) => Ok(client),
            None => Err(not_connected(&self.config)),
        }
    }

    async fn begin(&mut self) -> Result<()> {
        if self.in_transaction {
            return Ok(());
        }
        let client = self.client()?;
        run_batch(client, "BEGIN TRANSACTION").await?;
        self.in_transaction = true;
        Ok(())
    }

    async fn rollback(&mut self) {
        if !self.in_transaction {
            return;
        }
        self.in_transaction = false;
        if let Some(client) = self.client.as_mut() {
            // The server may already have aborted the transaction.
            if let Err(e) = run_batch(client, "IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION").await {
                tracing::warn!(error = %e, "SQL Server rollback failed");
            }
        }
    }
}

#[async_trait]
impl DatabaseAdapter for SqlServerAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    async fn connect(&mut self) -> Result<()> {
        if self.client.is_some() {
            return Ok(());
        }
        let config = self.tiberius_config();
        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| connection_error(&self.config, "Failed to reach SQL Server", e))?;
        tcp.set_nodelay(true)
            .map_err(|e| connection_error(&self.config, "Failed to configure socket", e))?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| connection_error(&self.config, "Failed to log in to SQL Server", e))?;
        tracing::debug!(hint = %self.config.connection_hint(), "Connected to SQL Server");
        self.client = Some(client);
        Ok(())
    }

    async fn execute_statement(&mut self, sql: &str) -> Result<()> {
        self.begin().await?;
        tracing::debug!(sql, "Executing statement");
        let result = Query::new(sql).execute(self.client()?).await;
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
        let per_statement = rows_per_statement(Dialect::SqlServer, columns.len());
        self.begin().await?;
        let client = self.client()?;

        let mut failure = None;
        for chunk in rows.chunks(per_statement) {
            let sql = build_insert_sql(Dialect::SqlServer, table, columns, chunk.len());
            let mut query = Query::new(sql.as_str());
            for row in chunk {
                for (value, column) in row.iter().zip(columns) {
                    query.bind(Param {
                        value,
                        column_type: &column.column_type,
                    });
                }
            }

            if let Err(e) = query.execute(&mut *client).await {
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
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        let client = self.client()?;
        run_batch(client, "COMMIT TRANSACTION").await
    }

    async fn close(&mut self) -> Result<()> {
        self.rollback().await;
        if let Some(client) = self.client.take() {
            if let Err(e) = client.close().await {
                tracing::warn!(error = %e, "SQL Server connection did not close cleanly");
            }
            tracing::debug!("SQL Server connection closed");
        }
        Ok(())
    }
}

async fn run_batch(client: &mut SqlServerClient, sql: &str) -> Result<()> {
    client
        .simple_query(sql)
        .await
        .map_err(|e| query_error(sql, e))?
        .into_results()
        .await
        .map_err(|e| query_error(sql, e))?;
    Ok(())
}

/// A value bound with its column type, so NULLs go over the wire typed.
struct Param<'a> {
    value: &'a Value,
    column_type: &'a ColumnType,
}

impl<'a> IntoSql<'a> for Param<'a> {
    fn into_sql(self) -> ColumnData<'a> {
        match self.value {
            Value::Null => match self.column_type {
                ColumnType::Identifier => ColumnData::Guid(None),
                ColumnType::Field(field_type) => match field_type {
                    FieldType::Int => ColumnData::I64(None),
                    FieldType::Float => ColumnData::F64(None),
                    FieldType::Boolean => ColumnData::Bit(None),
                    FieldType::Date => ColumnData::Date(None),
                    FieldType::Datetime => ColumnData::DateTime2(None),
                    FieldType::Varchar | FieldType::Text | FieldType::Other(_) => {
                        ColumnData::String(None)
                    }
                },
            },
            Value::Bool(b) => ColumnData::Bit(Some(*b)),
            Value::Int(i) => ColumnData::I64(Some(*i)),
            Value::Float(f) => ColumnData::F64(Some(*f)),
            Value::String(s) => ColumnData::String(Some(Cow::Borrowed(s.as_ref()))),
            Value::Date(d) => (*d).into_sql(),
            Value::Timestamp(ts) => (*ts).into_sql(),
            Value::Uuid(u) => ColumnData::Guid(Some(*u)),
        }
    }
}
