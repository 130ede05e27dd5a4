//! Error types for genbench-eval operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::rollup::Violation;

/// Result type alias for genbench-eval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while stitching, scoring or aggregating.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Failed to load an image file.
    #[error("Image load failed: {path}: {reason}")]
    ImageLoad {
        /// Path to the image that failed to load.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Failed to write a stitched panel.
    #[error("Image save failed: {path}: {reason}")]
    ImageSave {
        /// Destination path.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Malformed benchmark source tree (meta.json / auto_eval.jsonl).
    #[error("Case error: {path}: {reason}")]
    Case {
        /// Case directory or file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// Error talking to the remote scoring model.
    #[error("Model error ({model}): {message}")]
    Model {
        /// Model identifier.
        model: String,
        /// Error message.
        message: String,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Resume file does not match the summary being scored.
    #[error("Header mismatch between summary CSV and resume CSV: expected {expected:?}, found {found:?}")]
    HeaderMismatch {
        /// Header derived from the summary.
        expected: Vec<String>,
        /// Header found in the resume file.
        found: Vec<String>,
    },

    /// A row exhausted its retries and the batch was stopped.
    #[error("Retries failed for row {row} ({image}); progress saved to {saved_to}")]
    BatchAborted {
        /// 1-based data row index in the summary.
        row: usize,
        /// Stitched image of the failing row.
        image: String,
        /// Where partial results were written.
        saved_to: PathBuf,
    },

    /// The scored CSV failed pre-flight validation.
    #[error("{}", format_violations(.0))]
    Validation(Vec<Violation>),

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

fn format_violations(violations: &[Violation]) -> String {
    let details = violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    format!("Scored CSV failed validation ({} problem(s)): {details}", violations.len())
}
