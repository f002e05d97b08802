//! # Error Types
//!
//! Defines `FakeFillError`, the unified error enum for every failure mode in
//! the fill pipeline. Database-facing variants carry the driver error as their
//! source plus enough context (table, SQL snippet, row offset) to debug
//! without digging through logs.

use thiserror::Error;

/// Boxed driver error. sqlx and tiberius report through different types.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All errors that can occur in fakefill operations.
#[derive(Error, Debug)]
pub enum FakeFillError {
    #[error("Database connection failed: {message}\n  Connection: {connection_hint}\n  Cause: {source}")]
    Connection {
        message: String,
        connection_hint: String,
        #[source]
        source: BoxError,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Unsupported database '{name}'. Supported: postgres, sqlserver, sqlite")]
    UnsupportedDatabase { name: String },

    #[error("Field type '{field_type}' of column '{column}' is not supported\n  Supported types: int, float, varchar, text, date, datetime, boolean")]
    UnsupportedFieldType { column: String, field_type: String },

    #[error("Query failed (rolled back): {source}\n  SQL: {sql_preview}")]
    Query {
        sql_preview: String,
        #[source]
        source: BoxError,
    },

    #[error("Batch insert into {table} failed (rolled back {rows} rows starting at row {row_offset}): {source}\n  SQL: {sql_preview}")]
    BatchInsert {
        table: String,
        rows: usize,
        row_offset: usize,
        sql_preview: String,
        #[source]
        source: BoxError,
    },
}

impl FakeFillError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        FakeFillError::Configuration {
            message: message.into(),
        }
    }

    /// Shift a batch failure's row offset by rows inserted before the batch.
    pub(crate) fn offset_rows(self, inserted_before: usize) -> Self {
        match self {
            FakeFillError::BatchInsert {
                table,
                rows,
                row_offset,
                sql_preview,
                source,
            } => FakeFillError::BatchInsert {
                table,
                rows,
                row_offset: row_offset + inserted_before,
                sql_preview,
                source,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, FakeFillError>;

/// Truncate a SQL string for error messages.
pub(crate) fn truncate_sql(sql: &str, max_len: usize) -> String {
    if sql.len() <= max_len {
        return sql.to_string();
    }
    let mut end = max_len;
    while !sql.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &sql[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_sql_short() {
        assert_eq!(truncate_sql("SELECT 1", 200), "SELECT 1");
    }

    #[test]
    fn test_truncate_sql_long() {
        let sql = "A".repeat(300);
        let truncated = truncate_sql(&sql, 200);
        assert_eq!(truncated.len(), 203); // 200 chars + "..."
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_sql_multibyte_boundary() {
        // 'ç' spans bytes 3..5; cutting at byte 4 would split it
        let truncated = truncate_sql("preço_total", 4);
        assert_eq!(truncated, "pre...");
    }

    #[test]
    fn test_unsupported_field_type_message_names_column() {
        let err = FakeFillError::UnsupportedFieldType {
            column: "payload".to_string(),
            field_type: "blob".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("payload"));
        assert!(msg.contains("blob"));
    }
}
