//! Score rollup for fully scored benchmark results.
//!
//! The rollup turns per-question model scores into task, category and
//! overall percentages:
//!
//! 1. [`validate`] checks the raw CSV records and collects every problem
//!    before anything is aggregated.
//! 2. [`gate_case_scores`] applies the staged gating rule to the six
//!    questions of one case for one API call.
//! 3. [`rollup`] averages calls, then cases, then tasks per category.
//!
//! ## Example
//!
//! ```rust,ignore
//! use genbench_eval::rollup::{aggregate_file, RollupConfig};
//!
//! let report = aggregate_file("eval_results/gemini_results.csv", &RollupConfig::default())?;
//! print!("{}", report.render());
//! ```

mod category;
mod engine;
mod report;
mod validate;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use category::{BenchmarkCategory, CategoryEntry, CategoryTable};
pub use engine::{gate_case_scores, rollup};
pub use report::{CategoryScore, RollupReport, TaskScore};
pub use validate::{parse_rows, validate};

use crate::error::Result;

/// Number of scored rows in the stock benchmark.
pub const BENCHMARK_ROWS: usize = 306;

/// Column positions of the fields the rollup reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreColumns {
    /// Task display name.
    pub task_name: usize,
    /// Task identifier.
    pub task_id: usize,
    /// Case identifier.
    pub case_id: usize,
    /// Question identifier (1-based).
    pub question_id: usize,
    /// One score column per API call.
    pub scores: Vec<usize>,
}

impl ScoreColumns {
    /// Layout of a results CSV written by the scorer with `calls` calls per row.
    ///
    /// Six summary columns, then `(response, score, explanation)` per call.
    #[must_use]
    pub fn scorer_layout(calls: usize) -> Self {
        Self {
            task_name: 0,
            task_id: 1,
            case_id: 2,
            question_id: 3,
            scores: (0..calls).map(|i| 7 + 3 * i).collect(),
        }
    }

    /// Smallest record length that holds every column.
    #[must_use]
    pub fn min_len(&self) -> usize {
        let fixed = [self.task_name, self.task_id, self.case_id, self.question_id];
        fixed.iter().chain(&self.scores).copied().max().map_or(0, |m| m + 1)
    }
}

/// Configuration for a rollup run.
#[derive(Debug, Clone)]
pub struct RollupConfig {
    /// Required number of data rows, if any.
    pub expected_rows: Option<usize>,
    /// Questions per case.
    pub questions_per_case: usize,
    /// Divisor that turns gated case means into percentages.
    ///
    /// The stock benchmark reports against 6 even though a single question
    /// earns at most 1 in practice, so 6 is not a per-question ceiling the
    /// scorer is expected to reach. Scores above it are still rejected.
    pub max_score: u32,
    /// Category table used for the category rollup.
    pub categories: CategoryTable,
    /// Where fields live in each record.
    pub columns: ScoreColumns,
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            expected_rows: Some(BENCHMARK_ROWS),
            questions_per_case: 6,
            max_score: 6,
            categories: CategoryTable::benchmark(),
            columns: ScoreColumns::scorer_layout(3),
        }
    }
}

impl RollupConfig {
    /// Number of API calls per row.
    #[must_use]
    pub fn calls_per_row(&self) -> usize {
        self.columns.scores.len()
    }
}

/// One validated row of the scored CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredRow {
    /// Task display name.
    pub task_name: String,
    /// Task identifier.
    pub task_id: String,
    /// Case identifier.
    pub case_id: String,
    /// Question identifier.
    pub question_id: u32,
    /// Score from each API call, in call order.
    pub scores: Vec<u32>,
}

/// A problem found while validating the scored CSV.
///
/// Line numbers are 1-based and count the header as line 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    /// The file does not hold the required number of rows.
    RowCount {
        /// Required row count.
        expected: usize,
        /// Rows found.
        found: usize,
    },
    /// A record is too short to hold every configured column.
    MissingColumns {
        /// Offending line.
        line: usize,
        /// Fields present.
        found: usize,
    },
    /// A score cell is empty or not a non-negative integer.
    NonNumericScore {
        /// Offending line.
        line: usize,
        /// Column of the cell.
        column: usize,
        /// Cell contents.
        value: String,
    },
    /// A score is above the configured full-credit value.
    ScoreOutOfRange {
        /// Offending line.
        line: usize,
        /// Score found.
        value: u32,
        /// Configured maximum.
        max: u32,
    },
    /// The question id cell is not a positive integer.
    InvalidQuestionId {
        /// Offending line.
        line: usize,
        /// Cell contents.
        value: String,
    },
    /// A case does not have the configured number of distinct questions.
    IncompleteCase {
        /// Task identifier.
        task_id: String,
        /// Case identifier.
        case_id: String,
        /// Distinct questions found.
        found: usize,
        /// Questions required.
        expected: usize,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowCount { expected, found } => {
                write!(f, "the CSV file contains {found} rows of results, expected {expected}")
            }
            Self::MissingColumns { line, found } => {
                write!(f, "line {line}: only {found} columns")
            }
            Self::NonNumericScore { line, column, value } => {
                write!(f, "line {line}: missing or non-numeric score {value:?} in column {column}")
            }
            Self::ScoreOutOfRange { line, value, max } => {
                write!(f, "line {line}: score {value} exceeds maximum {max}")
            }
            Self::InvalidQuestionId { line, value } => {
                write!(f, "line {line}: invalid question id {value:?}")
            }
            Self::IncompleteCase { task_id, case_id, found, expected } => {
                write!(f, "case {task_id}/{case_id}: {found} questions, expected {expected}")
            }
        }
    }
}

/// Read a scored CSV, validate it and roll it up.
pub fn aggregate_file(path: impl AsRef<Path>, config: &RollupConfig) -> Result<RollupReport> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path.as_ref())?;

    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
    let rows = parse_rows(&records, config)?;
    Ok(rollup(&rows, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scorer_layout_columns() {
        let columns = ScoreColumns::scorer_layout(3);
        assert_eq!(columns.scores, vec![7, 10, 13]);
        assert_eq!(columns.min_len(), 14);
    }

    #[test]
    fn test_violation_messages_name_lines() {
        let v = Violation::NonNumericScore { line: 12, column: 10, value: String::new() };
        assert!(v.to_string().contains("line 12"));

        let v = Violation::RowCount { expected: 306, found: 305 };
        assert!(v.to_string().contains("305"));
    }

    fn write_scored_csv(path: &Path, cells: &[[&str; 3]]) {
        let mut writer = csv::Writer::from_path(path).unwrap();
        let mut header = vec!["task_name", "task_id", "case_id", "question_id", "text_prompt", "stitched_image"];
        for _ in 0..3 {
            header.extend(["gemini_result", "score", "explanation"]);
        }
        writer.write_record(&header).unwrap();
        for (i, scores) in cells.iter().enumerate() {
            let qid = (i + 1).to_string();
            writer
                .write_record([
                    "Storytelling", "14", "0001", qid.as_str(), "prompt", "0001.jpg",
                    "raw", scores[0], "ok", "raw", scores[1], "ok", "raw", scores[2], "ok",
                ])
                .unwrap();
        }
        writer.flush().unwrap();
    }

    #[test]
    fn test_aggregate_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scored.csv");
        write_scored_csv(&path, &[["1", "1", "1"]; 6]);

        let config = RollupConfig { expected_rows: Some(6), max_score: 1, ..RollupConfig::default() };
        let report = aggregate_file(&path, &config).unwrap();
        assert_eq!(report.tasks.len(), 1);
        assert!((report.tasks[0].percentage - 100.0).abs() < 1e-9);
        assert!((report.category("T2Is").unwrap().percentage - 100.0).abs() < 1e-9);
        assert!((report.overall - 20.0).abs() < 1e-9);
    }

    /// Writes a full benchmark-sized file: ten cases for one task of each
    /// category plus one case of an unmapped task, rows in reverse order.
    fn write_benchmark_csv(path: &Path) {
        let tasks = [("24", 10), ("63", 10), ("64", 10), ("14", 10), ("44", 10), ("99", 1)];
        let mut records = Vec::new();
        for (task_id, cases) in tasks {
            for case in 1..=cases {
                for qid in 1..=6 {
                    // Task 24 fails its first question everywhere.
                    let score = if task_id == "24" && qid == 1 { "0" } else { "1" };
                    records.push(vec![
                        format!("task {task_id}"),
                        task_id.to_string(),
                        format!("{case:04}"),
                        qid.to_string(),
                        "prompt".to_string(),
                        format!("{case:04}/000{qid}.jpg"),
                        "raw".to_string(), score.to_string(), "ok".to_string(),
                        "raw".to_string(), score.to_string(), "ok".to_string(),
                        "raw".to_string(), score.to_string(), "ok".to_string(),
                    ]);
                }
            }
        }
        records.reverse();
        assert_eq!(records.len(), BENCHMARK_ROWS);

        let mut writer = csv::Writer::from_path(path).unwrap();
        let mut header = vec!["task_name", "task_id", "case_id", "question_id", "text_prompt", "stitched_image"];
        for _ in 0..3 {
            header.extend(["gemini_result", "score", "explanation"]);
        }
        writer.write_record(&header).unwrap();
        for record in &records {
            writer.write_record(record).unwrap();
        }
        writer.flush().unwrap();
    }

    #[test]
    fn test_aggregate_benchmark_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gemini_results.csv");
        write_benchmark_csv(&path);

        let report = aggregate_file(&path, &RollupConfig::default()).unwrap();
        assert_eq!(report.excluded_tasks, vec!["99".to_string()]);
        assert_eq!(report.task("24").unwrap().cases, 10);

        // Task 24: q1 fails, so only q2 counts: (1/6) / 6 * 100.
        // Every other task: 6/6 / 6 * 100.
        let text = report.render();
        assert!(text.contains("Task 24 (task 24): 2.78\n"), "{text}");
        assert!(text.contains("Task 63 (task 63): 16.67\n"), "{text}");
        assert!(text.contains("\nT2I: 2.78\nI2I: 16.67\nIs2I: 16.67\nT2Is: 16.67\nIs2Is: 16.67\n"), "{text}");
        assert!(text.contains("Overall Average Score: 13.89"), "{text}");
    }

    #[test]
    fn test_aggregate_benchmark_file_reports_every_bad_cell() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gemini_results.csv");
        write_benchmark_csv(&path);

        // Blank a score on lines 6, 101 and 201 (header is line 1).
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<String> = content
            .lines()
            .enumerate()
            .map(|(idx, line)| {
                if [5, 100, 200].contains(&idx) {
                    line.replacen(",raw,1,ok,", ",raw,,ok,", 1)
                } else {
                    line.to_string()
                }
            })
            .collect();
        std::fs::write(&path, lines.join("\n") + "\n").unwrap();

        let message = aggregate_file(&path, &RollupConfig::default()).unwrap_err().to_string();
        assert!(message.contains("3 problem(s)"), "{message}");
        for line in ["line 6:", "line 101:", "line 201:"] {
            assert!(message.contains(line), "{message}");
        }
    }

    #[test]
    fn test_aggregate_file_rejects_row_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scored.csv");
        write_scored_csv(&path, &[["1", "1", "1"]; 6]);

        let err = aggregate_file(&path, &RollupConfig::default()).unwrap_err();
        assert!(err.to_string().contains("expected 306"));
    }
}
