use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};

use fakefill_core::generate::engine::{FakeDataGenerator, RunOptions};

use crate::args::RunArgs;
use crate::commands::load_config;

pub async fn run(args: &RunArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;
    if let Some(locale) = args.locale {
        config.generate.locale = Some(locale);
    }

    let mut options = RunOptions::new(0).with_config(&config.generate);
    match args.records {
        Some(records) => options.num_records = records,
        None if config.generate.records.is_none() => {
            bail!("Number of records not given. Pass --records or set [generate].records");
        }
        None => {}
    }
    if let Some(batch_size) = args.batch_size {
        options.batch_size = batch_size;
    }
    if let Some(p) = args.nullable_probability {
        options.nullable_probability = p;
    }
    if args.seed.is_some() {
        options.seed = args.seed;
    }

    let mut generator = FakeDataGenerator::new(&config)?;

    let pb = ProgressBar::new(options.num_records as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} Inserting rows... {bar:40.cyan/dim} {pos}/{len} ({eta})")?
            .progress_chars("█▓░"),
    );

    let report = generator
        .generate_and_insert(
            &options,
            Some(&|current: usize, _total: usize| {
                pb.set_position(current as u64);
            }),
        )
        .await;

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            pb.abandon();
            return Err(e.into());
        }
    };

    pb.finish_with_message("done");
    println!("✓ {}", report);
    println!(
        "  {} batches, seed {} (pass --seed {} to reproduce)",
        report.batches_flushed, report.seed, report.seed
    );
    Ok(())
}
