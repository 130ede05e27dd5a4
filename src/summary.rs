//! The summary table produced by the stitcher and consumed by the scorer.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File name of the summary table inside the stitched root.
pub const SUMMARY_FILE: &str = "summary.csv";

/// Column names of the summary table, in order.
pub const SUMMARY_HEADER: [&str; 6] =
    ["task_name", "task_id", "case_id", "question_id", "text_prompt", "stitched_image"];

/// One question ready for scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Task display name.
    pub task_name: String,
    /// Task identifier.
    pub task_id: String,
    /// Case identifier.
    pub case_id: String,
    /// 1-based question position within the case.
    pub question_id: u32,
    /// Prompt sent to the scoring model.
    pub text_prompt: String,
    /// Path of the stitched comparison panel.
    pub stitched_image: String,
}

/// Write the summary table with its header.
pub fn write_summary(path: impl AsRef<Path>, rows: &[SummaryRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    if rows.is_empty() {
        writer.write_record(SUMMARY_HEADER)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a summary table.
pub fn read_summary(path: impl AsRef<Path>) -> Result<Vec<SummaryRow>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let rows = reader.deserialize().collect::<std::result::Result<Vec<SummaryRow>, _>>()?;
    Ok(rows)
}
