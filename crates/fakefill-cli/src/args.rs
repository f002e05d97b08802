use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fakefill_core::generate::providers::Locale;

#[derive(Parser, Debug)]
#[command(
    name = "fakefill",
    about = "Fill a database table with realistic fake rows",
    version,
    after_help = "Examples:\n  fakefill run --records 1000\n  fakefill run --db postgres://localhost/app --records 500 --seed 42\n  fakefill ddl --config people.toml\n  fakefill preview --rows 10 --format json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the target table if needed and insert generated rows
    Run(RunArgs),

    /// Print the create-table statement without connecting
    Ddl(DdlArgs),

    /// Generate sample rows without touching a database
    Preview(PreviewArgs),
}

/// Where the table definition and connection come from.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Path to the config file
    #[arg(short, long, default_value = fakefill_core::config::CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Database connection URL (postgres://, sqlserver://, sqlite://)
    /// Overrides [database]; falls back to DATABASE_URL env var or .env file
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Number of rows to insert (default: [generate].records)
    #[arg(short = 'n', long)]
    pub records: Option<usize>,

    /// Rows per insert round trip
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Chance (0 to 1) that a nullable column is NULL
    #[arg(long)]
    pub nullable_probability: Option<f64>,

    /// Random seed for deterministic generation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Locale for names, addresses and text (pt_BR, en_US)
    #[arg(long)]
    pub locale: Option<Locale>,
}

#[derive(Parser, Debug)]
pub struct DdlArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Parser, Debug)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Number of sample rows
    #[arg(long, default_value = "5")]
    pub rows: usize,

    /// Chance (0 to 1) that a nullable column is NULL
    #[arg(long)]
    pub nullable_probability: Option<f64>,

    /// Random seed for deterministic generation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Locale for names, addresses and text (pt_BR, en_US)
    #[arg(long)]
    pub locale: Option<Locale>,

    /// Output format
    #[arg(long, default_value = "table")]
    pub format: PreviewFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PreviewFormat {
    Table,
    Json,
}
