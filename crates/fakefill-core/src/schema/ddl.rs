//! # Table Definition Builder
//!
//! Renders the idempotent "create the target table if it does not exist"
//! statement for each dialect. PostgreSQL and SQLite understand
//! `CREATE TABLE IF NOT EXISTS`; SQL Server wraps a plain `CREATE TABLE` in an
//! `OBJECT_ID` existence check.
//!
//! Unknown declared types never fail here: they become the dialect's
//! unbounded text type.

use crate::schema::types::{Dialect, FieldSpec, FieldType, TableIdent, ID_COLUMN};

/// Build the create statement for `table` with `fields` in declared order.
///
/// When `has_identifier` is set, a UUID primary-key column named `id` is
/// emitted first.
pub fn build_ddl(
    dialect: Dialect,
    table: &TableIdent,
    fields: &[FieldSpec],
    has_identifier: bool,
) -> String {
    let mut columns = Vec::with_capacity(fields.len() + 1);
    if has_identifier {
        columns.push(identifier_column(dialect));
    }
    for field in fields {
        let null = if field.nullable { "NULL" } else { "NOT NULL" };
        columns.push(format!(
            "{} {} {}",
            field.name,
            column_type(dialect, &field.field_type),
            null
        ));
    }
    let body = columns.join(",\n    ");

    match dialect {
        Dialect::PostgreSQL | Dialect::SQLite => format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            table.qualified(),
            body
        ),
        Dialect::SqlServer => format!(
            "IF OBJECT_ID(N'{}', N'U') IS NULL\nCREATE TABLE {} (\n    {}\n)",
            table.qualified().replace('\'', "''"),
            table.qualified(),
            body
        ),
    }
}

/// Map an abstract field type to the dialect's column type.
pub fn column_type(dialect: Dialect, field_type: &FieldType) -> &'static str {
    match dialect {
        Dialect::PostgreSQL | Dialect::SQLite => match field_type {
            FieldType::Int => "INTEGER",
            FieldType::Float => "FLOAT",
            FieldType::Varchar => "VARCHAR(255)",
            FieldType::Text => "TEXT",
            FieldType::Date => "DATE",
            FieldType::Datetime => "TIMESTAMP",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Other(_) => "TEXT",
        },
        Dialect::SqlServer => match field_type {
            FieldType::Int => "INT",
            FieldType::Float => "FLOAT",
            FieldType::Varchar => "NVARCHAR(255)",
            FieldType::Text => "NVARCHAR(MAX)",
            FieldType::Date => "DATE",
            FieldType::Datetime => "DATETIME2",
            FieldType::Boolean => "BIT",
            FieldType::Other(_) => "NVARCHAR(MAX)",
        },
    }
}

fn identifier_column(dialect: Dialect) -> String {
    match dialect {
        Dialect::PostgreSQL => format!("{} UUID PRIMARY KEY", ID_COLUMN),
        // Stored as hyphenated text so it reads back as a UUID string
        Dialect::SQLite => format!("{} TEXT PRIMARY KEY", ID_COLUMN),
        Dialect::SqlServer => format!("{} UNIQUEIDENTIFIER NOT NULL PRIMARY KEY", ID_COLUMN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> (TableIdent, Vec<FieldSpec>) {
        (
            TableIdent::new("public", "people"),
            vec![
                FieldSpec::new("name", FieldType::Varchar, false),
                FieldSpec::new("age", FieldType::Int, true),
            ],
        )
    }

    #[test]
    fn test_postgres_ddl_with_identifier() {
        let (table, fields) = people();
        let ddl = build_ddl(Dialect::PostgreSQL, &table, &fields, true);
        assert_eq!(
            ddl,
            "CREATE TABLE IF NOT EXISTS public.people (\n    \
             id UUID PRIMARY KEY,\n    \
             name VARCHAR(255) NOT NULL,\n    \
             age INTEGER NULL\n)"
        );
    }

    #[test]
    fn test_postgres_ddl_without_identifier() {
        let (table, fields) = people();
        let ddl = build_ddl(Dialect::PostgreSQL, &table, &fields, false);
        assert!(!ddl.contains("UUID"));
        assert!(ddl.contains("(\n    name VARCHAR(255) NOT NULL"));
    }

    #[test]
    fn test_column_order_follows_declaration() {
        let table = TableIdent::new("public", "t");
        let fields = vec![
            FieldSpec::new("zeta", FieldType::Int, false),
            FieldSpec::new("alpha", FieldType::Int, false),
        ];
        let ddl = build_ddl(Dialect::PostgreSQL, &table, &fields, true);
        let id = ddl.find("id UUID").unwrap();
        let zeta = ddl.find("zeta").unwrap();
        let alpha = ddl.find("alpha").unwrap();
        assert!(id < zeta && zeta < alpha);
    }

    #[test]
    fn test_type_mapping_postgres() {
        let expected = [
            (FieldType::Int, "INTEGER"),
            (FieldType::Float, "FLOAT"),
            (FieldType::Varchar, "VARCHAR(255)"),
            (FieldType::Text, "TEXT"),
            (FieldType::Date, "DATE"),
            (FieldType::Datetime, "TIMESTAMP"),
            (FieldType::Boolean, "BOOLEAN"),
        ];
        for (ft, sql) in expected {
            assert_eq!(column_type(Dialect::PostgreSQL, &ft), sql, "{}", ft);
        }
    }

    #[test]
    fn test_unknown_type_defaults_to_text() {
        let ft = FieldType::Other("geometry".to_string());
        assert_eq!(column_type(Dialect::PostgreSQL, &ft), "TEXT");
        assert_eq!(column_type(Dialect::SQLite, &ft), "TEXT");
        assert_eq!(column_type(Dialect::SqlServer, &ft), "NVARCHAR(MAX)");
    }

    #[test]
    fn test_sqlserver_ddl_guarded_by_object_id() {
        let table = TableIdent::new("dbo", "people");
        let fields = vec![FieldSpec::new("active", FieldType::Boolean, false)];
        let ddl = build_ddl(Dialect::SqlServer, &table, &fields, true);
        assert!(ddl.starts_with("IF OBJECT_ID(N'dbo.people', N'U') IS NULL\nCREATE TABLE dbo.people ("));
        assert!(ddl.contains("id UNIQUEIDENTIFIER NOT NULL PRIMARY KEY"));
        assert!(ddl.contains("active BIT NOT NULL"));
    }

    #[test]
    fn test_sqlite_identifier_is_text() {
        let table = TableIdent::new("main", "people");
        let ddl = build_ddl(Dialect::SQLite, &table, &[], true);
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS main.people"));
        assert!(ddl.contains("id TEXT PRIMARY KEY"));
    }
}
