use anyhow::{Context, Result};

use fakefill_core::schema::ddl::build_ddl;

use crate::args::DdlArgs;
use crate::commands::load_config;

pub fn run(args: &DdlArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let dialect = config
        .database
        .as_ref()
        .context("No database configured. Add a [database] section or pass --db to pick the dialect")?
        .dialect()?;
    let layout = config.table_layout()?;

    println!(
        "{};",
        build_ddl(dialect, &layout.table, &layout.fields, layout.has_id)
    );
    Ok(())
}
