//! # Fill Engine
//!
//! Owns the generate-and-insert loop: open a session, make sure the target
//! table exists, synthesize rows into fixed-size batches, hand each full
//! batch to the adapter, commit and close.
//!
//! A failing batch stops the run. Batches flushed before it stay committed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::adapter::{AnyAdapter, DatabaseAdapter, Session};
use crate::config::{
    validate_batch_size, validate_nullable_probability, FakeFillConfig, GenerateConfig,
    DEFAULT_BATCH_SIZE, DEFAULT_NULLABLE_PROBABILITY,
};
use crate::error::{FakeFillError, Result};
use crate::generate::providers::{generate_identifier, Synthesizer};
use crate::generate::value::{Row, Value};
use crate::schema::ddl::build_ddl;
use crate::schema::types::{Column, TableIdent, TableLayout};

/// Parameters of one fill run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub num_records: usize,
    pub batch_size: usize,
    /// Chance in [0, 1] that a nullable field is NULL.
    pub nullable_probability: f64,
    /// Fixed seed; a random one is drawn and logged when absent.
    pub seed: Option<u64>,
}

impl RunOptions {
    pub fn new(num_records: usize) -> Self {
        Self {
            num_records,
            batch_size: DEFAULT_BATCH_SIZE,
            nullable_probability: DEFAULT_NULLABLE_PROBABILITY,
            seed: None,
        }
    }

    /// Apply `[generate]` settings that are present.
    pub fn with_config(mut self, generate: &GenerateConfig) -> Self {
        if let Some(records) = generate.records {
            self.num_records = records;
        }
        if let Some(batch_size) = generate.batch_size {
            self.batch_size = batch_size;
        }
        if let Some(p) = generate.nullable_probability {
            self.nullable_probability = p;
        }
        if generate.seed.is_some() {
            self.seed = generate.seed;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_batch_size(self.batch_size)?;
        validate_nullable_probability(self.nullable_probability)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertReport {
    pub table: TableIdent,
    pub records_inserted: usize,
    pub batches_flushed: usize,
    /// Seed actually used; pass it back to reproduce the data.
    pub seed: u64,
}

impl std::fmt::Display for InsertReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} records inserted into {}.",
            self.records_inserted,
            self.table.qualified()
        )
    }
}

/// Builds rows for a table layout without touching a database.
#[derive(Debug, Clone)]
pub struct RowGenerator {
    layout: TableLayout,
    columns: Vec<Column>,
    synthesizer: Synthesizer,
}

impl RowGenerator {
    pub fn new(layout: TableLayout, synthesizer: Synthesizer) -> Self {
        let columns = layout.columns();
        Self {
            layout,
            columns,
            synthesizer,
        }
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// Insert columns, identifier first when present.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Generate one row in column order.
    ///
    /// For each nullable field a uniform draw `u` in [0, 1) decides: NULL
    /// when `u < nullable_probability`, a synthesized value otherwise.
    pub fn next_row<R: Rng>(&self, rng: &mut R, nullable_probability: f64) -> Result<Row> {
        let mut row = Vec::with_capacity(self.columns.len());
        if self.layout.has_id {
            row.push(generate_identifier(rng));
        }
        for field in &self.layout.fields {
            if field.nullable && rng.random::<f64>() < nullable_probability {
                row.push(Value::Null);
                continue;
            }
            row.push(self.synthesizer.synthesize(&field.name, &field.field_type, rng)?);
        }
        Ok(row)
    }
}

/// Drives one table fill through a database adapter.
pub struct FakeDataGenerator<A: DatabaseAdapter = AnyAdapter> {
    adapter: A,
    rows: RowGenerator,
}

impl FakeDataGenerator<AnyAdapter> {
    /// Build from a validated config, picking the adapter from `[database]`.
    ///
    /// Fails with `UnsupportedDatabase` or `Configuration` before any I/O.
    pub fn new(config: &FakeFillConfig) -> Result<Self> {
        let database = config.database.as_ref().ok_or_else(|| {
            FakeFillError::config(
                "No database configured. Add a [database] section or pass a connection URL",
            )
        })?;
        let adapter = AnyAdapter::for_config(database)?;
        let layout = config.table_layout()?;
        let locale = config.generate.locale.unwrap_or_default();
        Ok(Self::with_adapter(adapter, layout, Synthesizer::new(locale)))
    }
}

impl<A: DatabaseAdapter> FakeDataGenerator<A> {
    pub fn with_adapter(adapter: A, layout: TableLayout, synthesizer: Synthesizer) -> Self {
        Self {
            adapter,
            rows: RowGenerator::new(layout, synthesizer),
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// The create statement this generator would run.
    pub fn ddl(&self) -> String {
        let layout = self.rows.layout();
        build_ddl(
            self.adapter.dialect(),
            &layout.table,
            &layout.fields,
            layout.has_id,
        )
    }

    /// Create the table if needed and insert `options.num_records` rows.
    ///
    /// `progress` receives `(rows_inserted, total)` after every flush. The
    /// session is closed on every path, including failures.
    pub async fn generate_and_insert(
        &mut self,
        options: &RunOptions,
        progress: Option<&(dyn Fn(usize, usize) + Send + Sync)>,
    ) -> Result<InsertReport> {
        options.validate()?;

        let seed = match options.seed {
            Some(seed) => seed,
            None => {
                let seed: u64 = rand::rng().random();
                info!(seed, "No seed given, using a random one");
                seed
            }
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let ddl = self.ddl();
        let table = self.rows.layout().table.clone();

        info!(
            table = %table,
            dialect = %self.adapter.dialect(),
            records = options.num_records,
            batch_size = options.batch_size,
            "Starting fill"
        );

        let mut session = Session::open(&mut self.adapter).await?;
        let outcome = fill(&mut *session, &self.rows, &ddl, options, &mut rng, progress).await;
        let closed = session.close().await;
        let (records_inserted, batches_flushed) = outcome?;
        closed?;

        let report = InsertReport {
            table,
            records_inserted,
            batches_flushed,
            seed,
        };
        info!(batches = batches_flushed, seed, "{}", report);
        Ok(report)
    }
}

/// The body of a run, on an open session. Returns (rows, batches).
async fn fill<A: DatabaseAdapter, R: Rng>(
    adapter: &mut A,
    rows: &RowGenerator,
    ddl: &str,
    options: &RunOptions,
    rng: &mut R,
    progress: Option<&(dyn Fn(usize, usize) + Send + Sync)>,
) -> Result<(usize, usize)> {
    adapter.execute_statement(ddl).await?;

    let table = &rows.layout().table;
    let capacity = options.batch_size.min(options.num_records);
    let mut batch: Vec<Row> = Vec::with_capacity(capacity);
    let mut inserted = 0usize;
    let mut batches = 0usize;

    for i in 0..options.num_records {
        batch.push(rows.next_row(rng, options.nullable_probability)?);

        let last = i + 1 == options.num_records;
        if batch.len() == options.batch_size || last {
            let full = std::mem::replace(&mut batch, Vec::with_capacity(capacity));
            let n = full.len();
            adapter
                .insert_rows_batch(table, rows.columns(), full)
                .await
                .map_err(|e| e.offset_rows(inserted))?;
            inserted += n;
            batches += 1;
            debug!(batch = batches, rows = n, inserted, "Batch flushed");
            if let Some(cb) = progress {
                cb(inserted, options.num_records);
            }
        }
    }

    adapter.commit().await?;
    Ok((inserted, batches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{FieldSpec, FieldType};

    fn layout(has_id: bool) -> TableLayout {
        TableLayout::new(
            TableIdent::new("public", "people"),
            vec![
                FieldSpec::new("name", FieldType::Varchar, false),
                FieldSpec::new("age", FieldType::Int, true),
                FieldSpec::new("notes", FieldType::Text, true),
            ],
            has_id,
        )
    }

    fn generator(has_id: bool) -> RowGenerator {
        let base = chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        RowGenerator::new(layout(has_id), Synthesizer::default().with_base_time(base))
    }

    #[test]
    fn test_row_shape_with_identifier() {
        let mut rng = StdRng::seed_from_u64(1);
        let row = generator(true).next_row(&mut rng, 0.0).unwrap();
        assert_eq!(row.len(), 4);
        assert!(matches!(row[0], Value::Uuid(_)));
        assert!(row[1].as_string().is_some());
    }

    #[test]
    fn test_row_shape_without_identifier() {
        let mut rng = StdRng::seed_from_u64(1);
        let row = generator(false).next_row(&mut rng, 0.0).unwrap();
        assert_eq!(row.len(), 3);
        assert!(row[0].as_string().is_some());
    }

    #[test]
    fn test_probability_one_nulls_only_nullable_fields() {
        let mut rng = StdRng::seed_from_u64(7);
        let rows = generator(true);
        for _ in 0..50 {
            let row = rows.next_row(&mut rng, 1.0).unwrap();
            assert!(!row[0].is_null());
            assert!(!row[1].is_null(), "non-nullable field must never be NULL");
            assert!(row[2].is_null());
            assert!(row[3].is_null());
        }
    }

    #[test]
    fn test_probability_zero_never_nulls() {
        let mut rng = StdRng::seed_from_u64(7);
        let rows = generator(false);
        for _ in 0..50 {
            let row = rows.next_row(&mut rng, 0.0).unwrap();
            assert!(row.iter().all(|v| !v.is_null()));
        }
    }

    #[test]
    fn test_same_seed_same_rows() {
        let rows = generator(true);
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for _ in 0..10 {
            assert_eq!(
                rows.next_row(&mut a, 0.5).unwrap(),
                rows.next_row(&mut b, 0.5).unwrap()
            );
        }
    }

    #[test]
    fn test_unsupported_type_fails_row() {
        let layout = TableLayout::new(
            TableIdent::new("public", "shapes"),
            vec![FieldSpec::new("outline", FieldType::Other("geometry".into()), false)],
            false,
        );
        let rows = RowGenerator::new(layout, Synthesizer::default());
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            rows.next_row(&mut rng, 0.0),
            Err(FakeFillError::UnsupportedFieldType { .. })
        ));
    }

    #[test]
    fn test_run_options_defaults_and_validation() {
        let options = RunOptions::new(10);
        assert_eq!(options.batch_size, 100);
        assert_eq!(options.nullable_probability, 0.1);
        assert!(options.validate().is_ok());

        let zero_batch = RunOptions {
            batch_size: 0,
            ..RunOptions::new(10)
        };
        assert!(zero_batch.validate().is_err());

        let negative = RunOptions {
            nullable_probability: -0.1,
            ..RunOptions::new(10)
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_run_options_with_config() {
        let generate = GenerateConfig {
            records: Some(500),
            batch_size: Some(50),
            nullable_probability: None,
            seed: Some(3),
            locale: None,
        };
        let options = RunOptions::new(10).with_config(&generate);
        assert_eq!(options.num_records, 500);
        assert_eq!(options.batch_size, 50);
        assert_eq!(options.nullable_probability, 0.1);
        assert_eq!(options.seed, Some(3));
    }

    #[test]
    fn test_report_message() {
        let report = InsertReport {
            table: TableIdent::new("public", "people"),
            records_inserted: 5,
            batches_flushed: 1,
            seed: 0,
        };
        assert_eq!(report.to_string(), "5 records inserted into public.people.");
    }

    #[test]
    fn test_new_requires_database() {
        let config: FakeFillConfig = toml::from_str(
            "[target]\nschema = \"public\"\ntable = \"t\"\n[fields.a]\ntype = \"int\"\n",
        )
        .unwrap();
        assert!(matches!(
            FakeDataGenerator::new(&config),
            Err(FakeFillError::Configuration { .. })
        ));
    }
}
