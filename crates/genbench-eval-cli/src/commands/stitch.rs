//! Stitch command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use genbench_eval::stitch::run_stitch;

pub fn run(source_root: PathBuf, output_root: PathBuf) -> Result<()> {
    let outcome = run_stitch(&source_root, &output_root).with_context(|| {
        format!(
            "Failed to stitch {} against {}",
            source_root.display(),
            output_root.display()
        )
    })?;

    println!("Stitched {} panels ({} questions without outputs skipped)", outcome.rows, outcome.skipped);
    println!("Summary CSV saved to {}", outcome.summary_path.display());
    Ok(())
}
