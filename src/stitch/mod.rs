//! Comparison panel composition and the stitching job.
//!
//! Each question's input images are laid out in one row and its output
//! images in a second row below it, so the scoring model sees the prompt's
//! inputs and the generated results in a single picture.
//!
//! ## Example
//!
//! ```rust,ignore
//! use genbench_eval::stitch::run_stitch;
//!
//! let outcome = run_stitch("./bench", "./outputs/model_a")?;
//! println!("{} rows -> {}", outcome.rows, outcome.summary_path.display());
//! ```

mod placeholder;

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgb, RgbImage};
use tracing::{debug, info};

pub use placeholder::{PLACEHOLDER_SIZE, placeholder};

use crate::cases::{BenchmarkCase, Question, discover_cases};
use crate::error::{Error, Result};
use crate::summary::{SUMMARY_FILE, SummaryRow, write_summary};

/// Gap between images and between rows, in pixels.
pub const GAP: u32 = 20;

/// Prompts containing this text are scored against a numeric placeholder.
pub const DIGIT_PROMPT_MARKER: &str = "Is the number in the image the digit";

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Resize to `height`, keeping the aspect ratio.
#[must_use]
pub fn resize_to_height(img: &RgbImage, height: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    if h == height || h == 0 {
        return img.clone();
    }
    let width = ((f64::from(height) * f64::from(w) / f64::from(h)) as u32).max(1);
    imageops::resize(img, width, height.max(1), FilterType::Lanczos3)
}

/// Lay images out left to right with [`GAP`] pixels between them.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn stitch_horizontally(images: &[RgbImage]) -> Option<RgbImage> {
    if images.is_empty() {
        return None;
    }

    let gaps = GAP * (images.len() as u32 - 1);
    let width = images.iter().map(RgbImage::width).sum::<u32>() + gaps;
    let height = images.iter().map(RgbImage::height).max().unwrap_or(0);

    let mut row = RgbImage::from_pixel(width, height, BACKGROUND);
    let mut x = 0i64;
    for img in images {
        imageops::replace(&mut row, img, x, 0);
        x += i64::from(img.width() + GAP);
    }
    Some(row)
}

/// Compose the comparison panel for one question.
///
/// Inputs are scaled to the height of the first output. The input row sits
/// above the output row; either row may be missing.
#[must_use]
pub fn stitch_panel(inputs: &[RgbImage], outputs: &[RgbImage]) -> Option<RgbImage> {
    let resized: Vec<RgbImage>;
    let inputs = match outputs.first() {
        Some(first) => {
            resized = inputs.iter().map(|img| resize_to_height(img, first.height())).collect();
            resized.as_slice()
        }
        None => inputs,
    };

    match (stitch_horizontally(inputs), stitch_horizontally(outputs)) {
        (Some(top), Some(bottom)) => {
            let width = top.width().max(bottom.width());
            let height = top.height() + bottom.height() + GAP;
            let mut panel = RgbImage::from_pixel(width, height, BACKGROUND);
            imageops::replace(&mut panel, &top, 0, 0);
            imageops::replace(&mut panel, &bottom, 0, i64::from(top.height() + GAP));
            Some(panel)
        }
        (Some(row), None) | (None, Some(row)) => Some(row),
        (None, None) => None,
    }
}

/// Result of a stitching run.
#[derive(Debug, Clone)]
pub struct StitchOutcome {
    /// Where `summary.csv` was written.
    pub summary_path: PathBuf,
    /// Rows written to the summary.
    pub rows: usize,
    /// Questions skipped because no output image exists.
    pub skipped: usize,
}

/// Root for stitched panels: `<output_root>_stitched`.
#[must_use]
pub fn stitched_root(output_root: &Path) -> PathBuf {
    let mut name = OsString::from(output_root.as_os_str());
    name.push("_stitched");
    PathBuf::from(name)
}

/// Stitch every case under `source_root` against the outputs under
/// `output_root` and write the summary table.
pub fn run_stitch(source_root: impl AsRef<Path>, output_root: impl AsRef<Path>) -> Result<StitchOutcome> {
    let source_root = source_root.as_ref();
    let output_root = output_root.as_ref();
    let stitched = stitched_root(output_root);

    info!(source = %source_root.display(), outputs = %output_root.display(), "stitching");
    let cases = discover_cases(source_root)?;
    info!(cases = cases.len(), "discovered cases");

    let mut rows = Vec::new();
    let mut skipped = 0;
    for case in &cases {
        skipped += stitch_case(case, source_root, output_root, &stitched, &mut rows)?;
    }

    fs::create_dir_all(&stitched)?;
    let summary_path = stitched.join(SUMMARY_FILE);
    write_summary(&summary_path, &rows)?;
    info!(rows = rows.len(), skipped, path = %summary_path.display(), "summary written");

    Ok(StitchOutcome { summary_path, rows: rows.len(), skipped })
}

/// Stitch one case, appending summary rows. Returns the number of skipped questions.
fn stitch_case(
    case: &BenchmarkCase,
    source_root: &Path,
    output_root: &Path,
    stitched: &Path,
    rows: &mut Vec<SummaryRow>,
) -> Result<usize> {
    let source_dir = case.source_dir(source_root);
    let output_dir = case.output_dir(output_root);
    let panel_dir = stitched.join(&case.relative_path);
    let mut skipped = 0;

    for (question_id, question) in case.numbered_questions() {
        let outputs = load_existing(&output_dir, &question.output_images)?;
        if outputs.is_empty() {
            debug!(case = %case.relative_path.display(), question_id, "no output images, skipping");
            skipped += 1;
            continue;
        }

        let panel = if question.question.contains(DIGIT_PROMPT_MARKER) {
            placeholder(outputs.len())
        } else {
            let inputs = load_existing(&source_dir, &question.input_images)?;
            match stitch_panel(&inputs, &outputs) {
                Some(panel) => panel,
                None => continue,
            }
        };

        let panel_path = panel_dir.join(format!("000{question_id}.jpg"));
        save_jpeg(&panel, &panel_path)?;

        rows.push(summary_row(case, question_id, question, &panel_path));
    }

    Ok(skipped)
}

fn summary_row(case: &BenchmarkCase, question_id: u32, question: &Question, panel: &Path) -> SummaryRow {
    SummaryRow {
        task_name: case.task_name.clone(),
        task_id: case.task_id.clone(),
        case_id: case.case_id.clone(),
        question_id,
        text_prompt: question.question.clone(),
        stitched_image: panel.display().to_string(),
    }
}

/// Load the listed images that exist under `dir`; missing files are skipped.
fn load_existing(dir: &Path, names: &[String]) -> Result<Vec<RgbImage>> {
    names
        .iter()
        .map(|name| dir.join(name))
        .filter(|path| path.is_file())
        .map(|path| {
            image::open(&path)
                .map(|img| img.to_rgb8())
                .map_err(|e| Error::ImageLoad { path, reason: e.to_string() })
        })
        .collect()
}

fn save_jpeg(img: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    img.save_with_format(path, ImageFormat::Jpeg).map_err(|e| Error::ImageSave {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
