//! Benchmark source tree: cases, their metadata and their questions.
//!
//! A case directory holds a `meta.json` (task name and task id) and an
//! `auto_eval.jsonl` with one evaluation question per line. Input images
//! live next to the case files; generated output images live in a mirror of
//! the source tree under the output root.
//!
//! ## Example
//!
//! ```rust,ignore
//! use genbench_eval::cases::discover_cases;
//!
//! for case in discover_cases("./bench")? {
//!     println!("{} {} ({} questions)", case.task_id, case.case_id, case.questions.len());
//! }
//! ```

mod discovery;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use discovery::discover_cases;

/// Placeholder for metadata fields missing from `meta.json`.
pub const UNKNOWN_FIELD: &str = "N/A";

/// Metadata file expected in every case directory.
pub const META_FILE: &str = "meta.json";

/// Question list expected in every case directory.
pub const QUESTIONS_FILE: &str = "auto_eval.jsonl";

/// One evaluation question of a case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Question {
    /// Prompt sent to the scoring model.
    pub question: String,

    /// Input image file names, relative to the case directory.
    pub input_images: Vec<String>,

    /// Output image file names, relative to the mirrored output directory.
    pub output_images: Vec<String>,
}

/// A benchmark case discovered in the source tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkCase {
    /// Path from the source root to the case directory.
    pub relative_path: PathBuf,

    /// Last four characters of the case directory name.
    pub case_id: String,

    /// Task display name from `meta.json`.
    pub task_name: String,

    /// Task identifier (`uid` in `meta.json`).
    pub task_id: String,

    /// Questions in file order; question ids are 1-based positions.
    pub questions: Vec<Question>,
}

impl BenchmarkCase {
    /// Directory holding the case files and input images.
    #[must_use]
    pub fn source_dir(&self, source_root: &Path) -> PathBuf {
        source_root.join(&self.relative_path)
    }

    /// Mirrored directory holding the generated output images.
    #[must_use]
    pub fn output_dir(&self, output_root: &Path) -> PathBuf {
        output_root.join(&self.relative_path)
    }

    /// Questions paired with their 1-based ids.
    pub fn numbered_questions(&self) -> impl Iterator<Item = (u32, &Question)> {
        (1u32..).zip(&self.questions)
    }
}

/// Case id derived from a directory name: its last four characters.
#[must_use]
pub fn case_id_from_dir_name(name: &str) -> String {
    let count = name.chars().count();
    name.chars().skip(count.saturating_sub(4)).collect()
}
