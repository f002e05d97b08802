use std::path::Path;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use fakefill_core::adapter::DatabaseAdapter;
use fakefill_core::config::{DatabaseConfig, FakeFillConfig, FieldConfig, TargetConfig};
use fakefill_core::error::{FakeFillError, Result};
use fakefill_core::generate::value::Row;
use fakefill_core::schema::types::{Column, Dialect, FieldSpec, FieldType, TableIdent, TableLayout};
use indexmap::IndexMap;

/// Anchor for temporal values in tests.
pub fn fixed_base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 15)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap()
}

/// `(name varchar, age int nullable)`, the smallest realistic table.
pub fn people_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("name", FieldType::Varchar, false),
        FieldSpec::new("age", FieldType::Int, true),
    ]
}

/// One column of every supported declared type, none with a semantic name.
pub fn all_types_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("quantity", FieldType::Int, false),
        FieldSpec::new("ratio", FieldType::Float, false),
        FieldSpec::new("code", FieldType::Varchar, false),
        FieldSpec::new("notes", FieldType::Text, true),
        FieldSpec::new("born_on", FieldType::Date, true),
        FieldSpec::new("seen_at", FieldType::Datetime, true),
        FieldSpec::new("active", FieldType::Boolean, false),
    ]
}

pub fn people_layout(schema: &str, table: &str, has_id: bool) -> TableLayout {
    TableLayout::new(TableIdent::new(schema, table), people_fields(), has_id)
}

/// A full config for `fields` against a SQLite file at `path`.
pub fn sqlite_config(path: &Path, table: &str, fields: &[FieldSpec], has_id: bool) -> FakeFillConfig {
    let mut field_map = IndexMap::new();
    for field in fields {
        field_map.insert(
            field.name.clone(),
            FieldConfig {
                field_type: field.field_type.clone(),
                nullable: field.nullable,
            },
        );
    }
    FakeFillConfig {
        database: Some(
            DatabaseConfig::from_url(&format!("sqlite://{}", path.display())).unwrap(),
        ),
        target: TargetConfig {
            table: Some(table.to_string()),
            schema: Some("main".to_string()),
            dataset: None,
            has_id,
        },
        fields: field_map,
        ..Default::default()
    }
}

/// An adapter that records every call instead of talking to a database.
///
/// `log` holds one entry per call, in order: `connect`, `execute`,
/// `insert:<rows>`, `commit`, `close`.
#[derive(Debug)]
pub struct RecordingAdapter {
    pub dialect: Dialect,
    pub log: Vec<String>,
    pub statements: Vec<String>,
    pub batches: Vec<Vec<Row>>,
    pub columns: Vec<Column>,
    /// Fail the nth insert call (1-based).
    pub fail_on_batch: Option<usize>,
    pub fail_on_connect: bool,
    pub fail_on_statement: bool,
    connected: bool,
    insert_calls: usize,
}

impl RecordingAdapter {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            log: Vec::new(),
            statements: Vec::new(),
            batches: Vec::new(),
            columns: Vec::new(),
            fail_on_batch: None,
            fail_on_connect: false,
            fail_on_statement: false,
            connected: false,
            insert_calls: 0,
        }
    }

    pub fn failing_on_batch(mut self, n: usize) -> Self {
        self.fail_on_batch = Some(n);
        self
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.iter().map(Vec::len).collect()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.log.iter().filter(|e| e.as_str() == entry).count()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.batches.iter().flatten()
    }
}

#[async_trait]
impl DatabaseAdapter for RecordingAdapter {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn connect(&mut self) -> Result<()> {
        self.log.push("connect".to_string());
        if self.fail_on_connect {
            return Err(FakeFillError::Connection {
                message: "Connection refused".to_string(),
                connection_hint: "recording://".to_string(),
                source: "refused".into(),
            });
        }
        self.connected = true;
        Ok(())
    }

    async fn execute_statement(&mut self, sql: &str) -> Result<()> {
        self.log.push("execute".to_string());
        if self.fail_on_statement {
            return Err(FakeFillError::Query {
                sql_preview: sql.to_string(),
                source: "syntax error".into(),
            });
        }
        self.statements.push(sql.to_string());
        Ok(())
    }

    async fn insert_rows_batch(
        &mut self,
        table: &TableIdent,
        columns: &[Column],
        rows: Vec<Row>,
    ) -> Result<()> {
        self.insert_calls += 1;
        self.log.push(format!("insert:{}", rows.len()));
        if self.fail_on_batch == Some(self.insert_calls) {
            return Err(FakeFillError::BatchInsert {
                table: table.qualified(),
                rows: rows.len(),
                row_offset: 0,
                sql_preview: "INSERT INTO ...".to_string(),
                source: "constraint violation".into(),
            });
        }
        self.columns = columns.to_vec();
        self.batches.push(rows);
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.log.push("commit".to_string());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.log.push("close".to_string());
        self.connected = false;
        Ok(())
    }
}
