use anyhow::Result;
use comfy_table::Table as ComfyTable;
use rand::rngs::StdRng;
use rand::SeedableRng;

use fakefill_core::config::{validate_nullable_probability, DEFAULT_NULLABLE_PROBABILITY};
use fakefill_core::generate::engine::RowGenerator;
use fakefill_core::generate::providers::Synthesizer;
use fakefill_core::generate::value::Row;

use crate::args::{PreviewArgs, PreviewFormat};
use crate::commands::load_config;

/// Cells longer than this are cut in table output.
const MAX_CELL_CHARS: usize = 40;

pub fn run(args: &PreviewArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let layout = config.table_layout()?;
    let locale = args
        .locale
        .or(config.generate.locale)
        .unwrap_or_default();
    let p = args
        .nullable_probability
        .or(config.generate.nullable_probability)
        .unwrap_or(DEFAULT_NULLABLE_PROBABILITY);
    let seed = args.seed.or(config.generate.seed).unwrap_or(42);

    let generator = RowGenerator::new(layout, Synthesizer::new(locale));
    let rows = sample_rows(&generator, args.rows, p, seed)?;

    let columns: Vec<&str> = generator.columns().iter().map(|c| c.name.as_str()).collect();

    match args.format {
        PreviewFormat::Table => {
            println!(
                "━━━ {} ({} rows) ━━━",
                generator.layout().table,
                rows.len()
            );
            let mut t = ComfyTable::new();
            t.set_header(columns);
            for row in &rows {
                t.add_row(row.iter().map(|v| truncate_cell(&v.to_string())));
            }
            println!("{}\n", t);
        }
        PreviewFormat::Json => {
            let json = serde_json::json!({
                "table": generator.layout().table.qualified(),
                "columns": columns,
                "rows": rows
                    .iter()
                    .map(|row| row.iter().map(|v| v.to_json()).collect::<Vec<_>>())
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}

/// `count` rows from a fixed seed, rejecting the same probabilities `run` does.
fn sample_rows(
    generator: &RowGenerator,
    count: usize,
    nullable_probability: f64,
    seed: u64,
) -> fakefill_core::Result<Vec<Row>> {
    validate_nullable_probability(nullable_probability)?;
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| generator.next_row(&mut rng, nullable_probability))
        .collect()
}

fn truncate_cell(s: &str) -> String {
    if s.chars().count() > MAX_CELL_CHARS {
        let cut: String = s.chars().take(MAX_CELL_CHARS - 3).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}
