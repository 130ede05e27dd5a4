//! Remote model scoring of stitched panels.
//!
//! Every summary row is sent to a [`ScoringModel`] several times. Each
//! reply is parsed into a score and a rationale; unparseable replies and
//! transport errors are retried. Results are appended to a CSV that is
//! rewritten after every row, so an interrupted run can be resumed.
//!
//! ## Example
//!
//! ```rust,ignore
//! use genbench_eval::scoring::{GeminiClient, Scorer, ScorerConfig};
//!
//! let client = GeminiClient::new(std::env::var("GEMINI_API_KEY")?)?;
//! let config = ScorerConfig::builder().output_dir("eval_results").build();
//! let summary = Scorer::new(client, config).run("out_stitched/summary.csv", None)?;
//! println!("results: {}", summary.output_path.display());
//! ```

mod gemini;
mod parse;
mod runner;

use std::path::{Path, PathBuf};

pub use gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT, GeminiClient};
pub use parse::{ParsedScore, REASON_NOT_FOUND, extract_score};
pub use runner::{ScoreRunSummary, Scorer, result_columns};

use crate::error::Result;

/// A multimodal model that answers a prompt about one image.
pub trait ScoringModel {
    /// Model identifier, used in logs.
    fn name(&self) -> &str;

    /// Send `prompt` with the image at `image` and return the reply text.
    fn generate(&self, prompt: &str, image: &Path) -> Result<String>;
}

impl<M: ScoringModel + ?Sized> ScoringModel for &M {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn generate(&self, prompt: &str, image: &Path) -> Result<String> {
        (**self).generate(prompt, image)
    }
}

/// What to do with a row whose retries are exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Save progress and stop the run.
    #[default]
    AbortBatch,
    /// Record the row with empty score cells and continue.
    SkipRow,
}

/// One parsed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    /// Raw reply text.
    pub response: String,
    /// Parsed score.
    pub score: u32,
    /// Parsed rationale.
    pub explanation: String,
}

/// Outcome of scoring one summary row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// Every call produced a score.
    Scored(Vec<CallResult>),
    /// Retries ran out; the row is kept with empty cells.
    RowFailed {
        /// 1-based data row index.
        row: usize,
        /// Last failure seen.
        reason: String,
    },
    /// Retries ran out; the run stops.
    BatchAbort {
        /// 1-based data row index.
        row: usize,
        /// Last failure seen.
        reason: String,
    },
}

/// Configuration for a scoring run.
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    /// Model calls per row.
    pub calls_per_row: usize,
    /// Attempts per call before the row counts as failed.
    pub max_retries: usize,
    /// Handling of exhausted rows.
    pub failure_policy: FailurePolicy,
    /// Directory for new results files.
    pub output_dir: PathBuf,
    /// Explicit results path; overrides the timestamped name.
    pub output_path: Option<PathBuf>,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ScorerConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ScorerConfigBuilder {
        ScorerConfigBuilder::default()
    }
}

/// Builder for [`ScorerConfig`].
#[derive(Debug, Default)]
pub struct ScorerConfigBuilder {
    calls_per_row: Option<usize>,
    max_retries: Option<usize>,
    failure_policy: Option<FailurePolicy>,
    output_dir: Option<PathBuf>,
    output_path: Option<PathBuf>,
}

impl ScorerConfigBuilder {
    /// Set the number of model calls per row.
    #[must_use]
    pub fn calls_per_row(mut self, calls: usize) -> Self {
        self.calls_per_row = Some(calls);
        self
    }

    /// Set the attempts per call.
    #[must_use]
    pub fn max_retries(mut self, retries: usize) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set the failure policy.
    #[must_use]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    /// Set the results directory.
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Write results to exactly this path.
    #[must_use]
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ScorerConfig {
        ScorerConfig {
            calls_per_row: self.calls_per_row.unwrap_or(3).max(1),
            max_retries: self.max_retries.unwrap_or(10).max(1),
            failure_policy: self.failure_policy.unwrap_or_default(),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("eval_results")),
            output_path: self.output_path,
        }
    }
}
