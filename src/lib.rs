//! # genbench-eval
//!
//! Evaluation pipeline for a multimodal generation benchmark.
//!
//! A run has three stages, each usable on its own:
//!
//! 1. **Stitch**: compose every question's input and output images into a
//!    comparison panel and write `summary.csv`.
//! 2. **Score**: ask a multimodal model to grade each panel several times,
//!    writing a resumable results CSV.
//! 3. **Aggregate**: validate the scored CSV, apply the gating rule per case
//!    and report task, category and overall percentages.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use genbench_eval::{GeminiClient, RollupConfig, Scorer, ScorerConfig, aggregate_file, run_stitch};
//!
//! let stitched = run_stitch("./bench", "./outputs/model_a")?;
//!
//! let client = GeminiClient::new(std::env::var("GEMINI_API_KEY")?)?;
//! let scored = Scorer::new(client, ScorerConfig::default()).run(&stitched.summary_path, None)?;
//!
//! let report = aggregate_file(&scored.output_path, &RollupConfig::default())?;
//! print!("{}", report.render());
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`cases`]: Benchmark case discovery
//! - [`stitch`]: Comparison panels and the stitching job
//! - [`summary`]: The summary table shared by stitcher and scorer
//! - [`scoring`]: Remote model scoring with retries and resume
//! - [`rollup`]: Validation, gating and percentage rollup
//! - [`stats`]: Summary statistics

pub mod cases;
pub mod error;
pub mod rollup;
pub mod scoring;
pub mod stats;
pub mod stitch;
pub mod summary;

// Re-export commonly used types
pub use cases::{BenchmarkCase, Question, discover_cases};
pub use error::{Error, Result};
pub use rollup::{
    BenchmarkCategory, CategoryTable, RollupConfig, RollupReport, ScoredRow, Violation,
    aggregate_file, gate_case_scores, rollup,
};
pub use scoring::{
    FailurePolicy, GeminiClient, RowOutcome, ScoreRunSummary, Scorer, ScorerConfig, ScoringModel,
    extract_score,
};
pub use stats::Summary;
pub use stitch::{StitchOutcome, run_stitch};
pub use summary::SummaryRow;
