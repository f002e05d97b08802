//! # Configuration File Parser
//!
//! Reads and parses `fakefill.toml`, which declares where to write and what
//! to generate:
//!
//! - `[database]`: dialect and connection parameters
//! - `[target]`: schema (or dataset) and table name, identifier column
//! - `[fields.<column>]`: declared type and nullability, in column order
//! - `[generate]`: default record count, batch size, null probability, seed
//!
//! Example `fakefill.toml`:
//!
//! ```toml
//! [database]
//! db = "postgres"
//! host = "localhost"
//! port = 5432
//! database = "app"
//! user = "postgres"
//! password = "secret"
//!
//! [target]
//! schema = "public"
//! table = "people"
//!
//! [fields.name]
//! type = "varchar"
//!
//! [fields.age]
//! type = "int"
//! nullable = true
//!
//! [generate]
//! records = 1000
//! batch_size = 100
//! nullable_probability = 0.1
//! seed = 42
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use serde::Deserialize;

use crate::error::{FakeFillError, Result};
use crate::generate::providers::Locale;
use crate::schema::types::{Dialect, FieldSpec, FieldType, TableIdent, TableLayout};

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "fakefill.toml";

/// Rows per insert round trip unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Chance that a nullable field is emitted as NULL unless configured otherwise.
pub const DEFAULT_NULLABLE_PROBABILITY: f64 = 0.1;

/// Top-level fakefill.toml structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FakeFillConfig {
    /// Connection settings. May be supplied by a URL instead.
    pub database: Option<DatabaseConfig>,
    /// Target table identity.
    pub target: TargetConfig,
    /// Column declarations, in table order.
    pub fields: IndexMap<String, FieldConfig>,
    /// Default generation settings.
    pub generate: GenerateConfig,

    /// Path the config was read from, for error messages.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

/// Connection parameters for one database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// Dialect name: "postgres", "sqlserver" or "sqlite".
    pub db: String,
    #[serde(default = "default_host", alias = "server")]
    pub host: String,
    /// Falls back to the dialect's default port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Database name; the file path for SQLite (":memory:" for in-memory).
    pub database: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// SQL Server only: accept the server certificate without validation.
    #[serde(default)]
    pub trust_server_certificate: bool,
}

fn default_host() -> String {
    "localhost".to_string()
}

/// Target table settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub table: Option<String>,
    pub schema: Option<String>,
    /// Alias of `schema`; exactly one of the two may be given.
    pub dataset: Option<String>,
    /// Prepend a UUID primary-key column named `id`.
    pub has_id: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            table: None,
            schema: None,
            dataset: None,
            has_id: true,
        }
    }
}

/// One `[fields.<column>]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldConfig {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub nullable: bool,
}

/// Default generation settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    pub records: Option<usize>,
    pub batch_size: Option<usize>,
    pub nullable_probability: Option<f64>,
    /// Fixed random seed for deterministic generation.
    pub seed: Option<u64>,
    pub locale: Option<Locale>,
}

/// Read and parse a fakefill.toml file.
///
/// Returns `None` if the file doesn't exist.
/// Returns an error if the file exists but can't be parsed or validated.
pub fn read_config(path: &Path) -> Result<Option<FakeFillConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        FakeFillError::config(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let mut config: FakeFillConfig = toml::from_str(&content).map_err(|e| {
        FakeFillError::config(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    config.source_path = Some(path.to_path_buf());

    config.validate()?;

    Ok(Some(config))
}

impl FakeFillConfig {
    /// Validate constraints that serde cannot enforce.
    ///
    /// Connection settings are not required here since they may arrive as a
    /// URL later; `TableLayout` construction checks the target and fields.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref db) = self.database {
            db.dialect()?;
        }
        self.target.resolve(&self.fields)?;
        if let Some(batch_size) = self.generate.batch_size {
            validate_batch_size(batch_size)?;
        }
        if let Some(p) = self.generate.nullable_probability {
            validate_nullable_probability(p)?;
        }
        Ok(())
    }

    /// Build the table layout from `[target]` and `[fields]`.
    pub fn table_layout(&self) -> Result<TableLayout> {
        self.target.resolve(&self.fields)
    }
}

impl TargetConfig {
    /// Resolve the schema/dataset name and the ordered field specs.
    pub fn resolve(&self, fields: &IndexMap<String, FieldConfig>) -> Result<TableLayout> {
        let schema = match (&self.schema, &self.dataset) {
            (Some(s), None) | (None, Some(s)) => s,
            (None, None) => {
                return Err(FakeFillError::config(
                    "Either [target].schema or [target].dataset must be provided",
                ))
            }
            (Some(_), Some(_)) => {
                return Err(FakeFillError::config(
                    "[target].schema and [target].dataset are the same setting; provide only one",
                ))
            }
        };
        if schema.trim().is_empty() {
            return Err(FakeFillError::config("[target].schema must not be empty"));
        }

        let table = match self.table.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Err(FakeFillError::config("[target].table must be provided")),
        };

        if fields.is_empty() {
            return Err(FakeFillError::config(
                "At least one [fields.<column>] entry is required",
            ));
        }

        let specs = fields
            .iter()
            .map(|(name, cfg)| FieldSpec::new(name.clone(), cfg.field_type.clone(), cfg.nullable))
            .collect();

        Ok(TableLayout::new(
            TableIdent::new(schema.trim(), table),
            specs,
            self.has_id,
        ))
    }
}

impl DatabaseConfig {
    /// Resolve the `db` name into a supported dialect.
    pub fn dialect(&self) -> Result<Dialect> {
        self.db.parse()
    }

    /// Configured port or the dialect's default.
    pub fn effective_port(&self) -> Option<u16> {
        match self.dialect() {
            Ok(dialect) => self.port.or(dialect.default_port()),
            Err(_) => self.port,
        }
    }

    /// Parse a connection URL.
    ///
    /// Accepts `postgres://`/`postgresql://`, `sqlserver://`/`mssql://` and
    /// `sqlite://<path>` or `sqlite::memory:`. Credentials are percent-decoded.
    pub fn from_url(raw: &str) -> Result<Self> {
        if let Some(rest) = raw.strip_prefix("sqlite:") {
            let database = rest.strip_prefix("//").unwrap_or(rest);
            let database = match database {
                "" | ":memory:" => ":memory:".to_string(),
                path => path.split('?').next().unwrap_or(path).to_string(),
            };
            return Ok(Self {
                db: "sqlite".to_string(),
                host: String::new(),
                port: None,
                database,
                user: String::new(),
                password: String::new(),
                trust_server_certificate: false,
            });
        }

        let parsed = url::Url::parse(raw).map_err(|e| {
            FakeFillError::config(format!("Invalid database URL: {}", e))
        })?;
        let dialect: Dialect = parsed.scheme().parse()?;

        let decode = |s: &str| percent_decode_str(s).decode_utf8_lossy().into_owned();
        let database = parsed.path().trim_start_matches('/');
        if database.is_empty() {
            return Err(FakeFillError::config(
                "Database URL must include a database name, e.g. postgres://host/app",
            ));
        }

        let trust_server_certificate = parsed
            .query_pairs()
            .any(|(k, v)| k.eq_ignore_ascii_case("trust_server_certificate") && v == "true");

        Ok(Self {
            db: dialect.config_name().to_string(),
            host: parsed.host_str().unwrap_or("localhost").to_string(),
            port: parsed.port(),
            database: decode(database),
            user: decode(parsed.username()),
            password: parsed.password().map(decode).unwrap_or_default(),
            trust_server_certificate,
        })
    }

    /// Connection description for error messages, password masked.
    pub fn connection_hint(&self) -> String {
        let scheme = match self.dialect() {
            Ok(d) => d.config_name(),
            Err(_) => self.db.as_str(),
        };
        if scheme == "sqlite" {
            return format!("sqlite://{}", self.database);
        }

        let mut hint = match url::Url::parse(&format!("{}://{}", scheme, self.host)) {
            Ok(u) => u,
            Err(_) => return format!("{}://{}/{}", scheme, self.host, self.database),
        };
        if !self.user.is_empty() {
            let _ = hint.set_username(&self.user);
        }
        if !self.password.is_empty() {
            let _ = hint.set_password(Some("****"));
        }
        let _ = hint.set_port(self.effective_port());
        hint.set_path(&self.database);
        hint.to_string()
    }
}

pub(crate) fn validate_batch_size(batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(FakeFillError::config("batch_size must be at least 1"));
    }
    Ok(())
}

pub fn validate_nullable_probability(p: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(FakeFillError::config(format!(
            "nullable_probability must be between 0 and 1, got {}",
            p
        )));
    }
    Ok(())
}
