//! Aggregate command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use genbench_eval::rollup::{CategoryTable, RollupConfig, aggregate_file};

pub fn run(
    input: PathBuf,
    categories: Option<PathBuf>,
    expected_rows: usize,
    max_score: u32,
    json: bool,
    spread: bool,
) -> Result<()> {
    anyhow::ensure!(max_score > 0, "--max-score must be positive");

    let mut config = RollupConfig {
        expected_rows: (expected_rows > 0).then_some(expected_rows),
        max_score,
        ..RollupConfig::default()
    };
    if let Some(path) = categories {
        config.categories = CategoryTable::load(&path)
            .with_context(|| format!("Failed to load category table from {}", path.display()))?;
    }

    let report = aggregate_file(&input, &config)
        .with_context(|| format!("Failed to aggregate {}", input.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
        if spread {
            println!();
            print!("{}", report.render_spread());
        }
    }
    Ok(())
}
