use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FakeFillError;

/// Name of the generated primary-key column.
pub const ID_COLUMN: &str = "id";

/// Database product whose SQL syntax and placeholder convention we speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    PostgreSQL,
    SqlServer,
    SQLite,
}

impl Dialect {
    /// Bind placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::PostgreSQL => format!("${}", index),
            Dialect::SqlServer => format!("@P{}", index),
            Dialect::SQLite => "?".to_string(),
        }
    }

    /// Maximum bind parameters accepted in a single statement.
    pub fn max_bind_params(&self) -> usize {
        match self {
            Dialect::PostgreSQL => 65_535,
            // Hard limit is 2100 per RPC call; leave headroom.
            Dialect::SqlServer => 2_000,
            Dialect::SQLite => 32_766,
        }
    }

    /// Maximum row constructors in one `VALUES` list.
    pub fn max_rows_per_statement(&self) -> usize {
        match self {
            Dialect::SqlServer => 1_000,
            Dialect::PostgreSQL | Dialect::SQLite => usize::MAX,
        }
    }

    pub fn default_port(&self) -> Option<u16> {
        match self {
            Dialect::PostgreSQL => Some(5432),
            Dialect::SqlServer => Some(1433),
            Dialect::SQLite => None,
        }
    }

    /// Name used in config files and connection URLs.
    pub fn config_name(&self) -> &'static str {
        match self {
            Dialect::PostgreSQL => "postgres",
            Dialect::SqlServer => "sqlserver",
            Dialect::SQLite => "sqlite",
        }
    }
}

impl FromStr for Dialect {
    type Err = FakeFillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::PostgreSQL),
            "sqlserver" | "mssql" => Ok(Dialect::SqlServer),
            "sqlite" => Ok(Dialect::SQLite),
            _ => Err(FakeFillError::UnsupportedDatabase {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::PostgreSQL => write!(f, "PostgreSQL"),
            Dialect::SqlServer => write!(f, "SQL Server"),
            Dialect::SQLite => write!(f, "SQLite"),
        }
    }
}

/// Abstract column type declared in the field config.
///
/// Unrecognized declarations are kept verbatim in `Other` so the DDL builder
/// can fall back to TEXT while the synthesizer rejects them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Int,
    Float,
    Varchar,
    Text,
    Date,
    Datetime,
    Boolean,
    Other(String),
}

impl FieldType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "int" => FieldType::Int,
            "float" => FieldType::Float,
            "varchar" => FieldType::Varchar,
            "text" => FieldType::Text,
            "date" => FieldType::Date,
            "datetime" => FieldType::Datetime,
            "boolean" => FieldType::Boolean,
            _ => FieldType::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Varchar => "varchar",
            FieldType::Text => "text",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Boolean => "boolean",
            FieldType::Other(raw) => raw,
        }
    }
}

impl From<String> for FieldType {
    fn from(raw: String) -> Self {
        FieldType::parse(&raw)
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative description of one target column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub nullable: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable,
        }
    }
}

/// `(schema, table)` pair. Neither part is quoted or validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableIdent {
    pub schema: String,
    pub table: String,
}

impl TableIdent {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

impl fmt::Display for TableIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Type of a column as the adapters bind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// Generated UUID primary key.
    Identifier,
    Field(FieldType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

/// Everything needed to create the target table and shape its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub table: TableIdent,
    pub fields: Vec<FieldSpec>,
    pub has_id: bool,
}

impl TableLayout {
    pub fn new(table: TableIdent, fields: Vec<FieldSpec>, has_id: bool) -> Self {
        Self {
            table,
            fields,
            has_id,
        }
    }

    /// Insert columns in positional order, identifier first when present.
    pub fn columns(&self) -> Vec<Column> {
        let id = self.has_id.then(|| Column {
            name: ID_COLUMN.to_string(),
            column_type: ColumnType::Identifier,
        });
        id.into_iter()
            .chain(self.fields.iter().map(|f| Column {
                name: f.name.clone(),
                column_type: ColumnType::Field(f.field_type.clone()),
            }))
            .collect()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns().into_iter().map(|c| c.name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_parse_known() {
        assert_eq!(FieldType::parse("int"), FieldType::Int);
        assert_eq!(FieldType::parse(" VARCHAR "), FieldType::Varchar);
        assert_eq!(FieldType::parse("datetime"), FieldType::Datetime);
        assert_eq!(FieldType::parse("boolean"), FieldType::Boolean);
    }

    #[test]
    fn test_field_type_parse_unknown_kept_verbatim() {
        let ft = FieldType::parse("jsonb");
        assert_eq!(ft, FieldType::Other("jsonb".to_string()));
        assert_eq!(ft.to_string(), "jsonb");
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("postgres".parse::<Dialect>().unwrap(), Dialect::PostgreSQL);
        assert_eq!("SQLServer".parse::<Dialect>().unwrap(), Dialect::SqlServer);
        assert_eq!("sqlite".parse::<Dialect>().unwrap(), Dialect::SQLite);
    }

    #[test]
    fn test_dialect_from_str_unsupported() {
        let err = "oracle".parse::<Dialect>().unwrap_err();
        assert!(matches!(err, FakeFillError::UnsupportedDatabase { ref name } if name == "oracle"));
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(Dialect::PostgreSQL.placeholder(3), "$3");
        assert_eq!(Dialect::SqlServer.placeholder(3), "@P3");
        assert_eq!(Dialect::SQLite.placeholder(3), "?");
    }

    #[test]
    fn test_layout_columns_identifier_first() {
        let layout = TableLayout::new(
            TableIdent::new("public", "people"),
            vec![
                FieldSpec::new("name", FieldType::Varchar, false),
                FieldSpec::new("age", FieldType::Int, true),
            ],
            true,
        );
        assert_eq!(layout.column_names(), vec!["id", "name", "age"]);
        assert_eq!(layout.columns()[0].column_type, ColumnType::Identifier);
    }

    #[test]
    fn test_layout_columns_without_identifier() {
        let layout = TableLayout::new(
            TableIdent::new("public", "people"),
            vec![FieldSpec::new("name", FieldType::Varchar, false)],
            false,
        );
        assert_eq!(layout.column_names(), vec!["name"]);
    }

    #[test]
    fn test_table_ident_qualified() {
        assert_eq!(TableIdent::new("dbo", "orders").qualified(), "dbo.orders");
    }
}
