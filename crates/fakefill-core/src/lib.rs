pub mod adapter;
pub mod classify;
pub mod config;
pub mod error;
pub mod generate;
pub mod schema;

// Re-export key types for convenience
pub use adapter::{AnyAdapter, DatabaseAdapter, Session};
pub use config::{DatabaseConfig, FakeFillConfig};
pub use error::{FakeFillError, Result};
pub use generate::engine::{FakeDataGenerator, InsertReport, RowGenerator, RunOptions};
pub use generate::providers::{Locale, Synthesizer};
pub use generate::value::{Row, Value};
pub use schema::types::{Dialect, FieldSpec, FieldType, TableIdent, TableLayout};
