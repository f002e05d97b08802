pub mod ddl;
pub mod preview;
pub mod run;

use anyhow::{Context, Result};
use fakefill_core::config::{read_config, DatabaseConfig, FakeFillConfig};

use crate::args::ConfigArgs;

/// Read the config file and apply a `--db`/`DATABASE_URL` override.
pub fn load_config(args: &ConfigArgs) -> Result<FakeFillConfig> {
    let mut config = read_config(&args.config)?.with_context(|| {
        format!(
            "No config file found at {}. Create one with [target] and [fields.<column>] sections.",
            args.config.display()
        )
    })?;

    if let Some(url) = args.db.as_deref() {
        config.database = Some(DatabaseConfig::from_url(url)?);
    }
    tracing::debug!(
        path = %args.config.display(),
        fields = config.fields.len(),
        "Loaded config"
    );
    Ok(config)
}
