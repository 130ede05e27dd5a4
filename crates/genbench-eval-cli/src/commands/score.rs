//! Score command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use genbench_eval::scoring::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, FailurePolicy, GeminiClient, Scorer, ScorerConfig,
};

#[derive(Args)]
pub struct ScoreArgs {
    /// Summary CSV written by `stitch`
    summary: PathBuf,

    /// Existing results CSV to continue from
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Directory for the timestamped results CSV
    #[arg(long, default_value = "eval_results")]
    output_dir: PathBuf,

    /// Gemini model name
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Gemini API root
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Attempts per call before a row counts as failed
    #[arg(long, default_value_t = 10)]
    max_retries: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Keep going past rows whose retries run out, leaving their scores empty
    #[arg(long)]
    skip_failed_rows: bool,
}

pub fn run(args: ScoreArgs) -> Result<()> {
    anyhow::ensure!(args.summary.is_file(), "Summary CSV file not found at {}", args.summary.display());

    let client = GeminiClient::with_options(
        args.api_key,
        args.model,
        args.base_url,
        Duration::from_secs(args.timeout_secs),
    )
    .context("Failed to create Gemini client")?;

    let policy = if args.skip_failed_rows { FailurePolicy::SkipRow } else { FailurePolicy::AbortBatch };
    let config = ScorerConfig::builder()
        .max_retries(args.max_retries)
        .failure_policy(policy)
        .output_dir(&args.output_dir)
        .build();

    let summary = Scorer::new(client, config)
        .run(&args.summary, args.resume.as_deref())
        .with_context(|| format!("Failed to score {}", args.summary.display()))?;

    println!(
        "Scored {} rows ({} resumed, {} failed) of {}",
        summary.scored_rows, summary.resumed_rows, summary.failed_rows, summary.total_rows
    );
    println!("Updated CSV file with Gemini results saved to {}", summary.output_path.display());
    Ok(())
}
