//! genbench-eval CLI - stitch, score and aggregate benchmark results

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

/// Evaluation pipeline for a multimodal generation benchmark.
#[derive(Parser)]
#[command(name = "genbench-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stitch input and output images into comparison panels
    Stitch {
        /// Benchmark source directory (holds meta.json / auto_eval.jsonl per case)
        source_root: PathBuf,

        /// Model output directory mirroring the source layout
        output_root: PathBuf,
    },

    /// Score every panel of a summary CSV with Gemini
    Score(commands::score::ScoreArgs),

    /// Validate a scored CSV and print task, category and overall scores
    Aggregate {
        /// Scored results CSV
        input: PathBuf,

        /// JSON category table replacing the built-in one
        #[arg(long)]
        categories: Option<PathBuf>,

        /// Required number of data rows (0 disables the check)
        #[arg(long, default_value_t = genbench_eval::rollup::BENCHMARK_ROWS)]
        expected_rows: usize,

        /// Full-credit score of a single question
        #[arg(long, default_value_t = 6)]
        max_score: u32,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Also print the spread of case scores per task
        #[arg(long)]
        spread: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default},hyper=warn,reqwest=warn")));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .ok();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Stitch { source_root, output_root } => {
            commands::stitch::run(source_root, output_root)
        }
        Commands::Score(args) => commands::score::run(args),
        Commands::Aggregate { input, categories, expected_rows, max_score, json, spread } => {
            commands::aggregate::run(input, categories, expected_rows, max_score, json, spread)
        }
    }
}
