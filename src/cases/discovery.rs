//! Case discovery in a benchmark source tree.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::cases::{
    BenchmarkCase, META_FILE, QUESTIONS_FILE, Question, UNKNOWN_FIELD, case_id_from_dir_name,
};
use crate::error::{Error, Result};

/// Discover every case directory below `source_root`.
///
/// A directory is a case when it holds both `meta.json` and
/// `auto_eval.jsonl`. The root itself is never a case. Cases are returned
/// in sorted path order.
pub fn discover_cases(source_root: impl AsRef<Path>) -> Result<Vec<BenchmarkCase>> {
    let root = source_root.as_ref();
    if !root.is_dir() {
        return Err(Error::Case {
            path: root.to_path_buf(),
            reason: "source root is not a directory".to_string(),
        });
    }

    let mut cases = Vec::new();
    discover_recursive(root, root, &mut cases)?;
    Ok(cases)
}

fn discover_recursive(root: &Path, current: &Path, cases: &mut Vec<BenchmarkCase>) -> Result<()> {
    let mut dirs: Vec<_> = fs::read_dir(current)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| {
            !path
                .file_name()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.starts_with('.'))
        })
        .collect();
    dirs.sort();

    for dir in dirs {
        if let Some(case) = load_case(root, &dir)? {
            debug!(path = %dir.display(), questions = case.questions.len(), "found case");
            cases.push(case);
        }
        discover_recursive(root, &dir, cases)?;
    }

    Ok(())
}

fn load_case(root: &Path, dir: &Path) -> Result<Option<BenchmarkCase>> {
    let meta_path = dir.join(META_FILE);
    let questions_path = dir.join(QUESTIONS_FILE);
    if !meta_path.is_file() || !questions_path.is_file() {
        return Ok(None);
    }

    let meta: Value = serde_json::from_str(&fs::read_to_string(&meta_path)?).map_err(|e| {
        Error::Case { path: meta_path.clone(), reason: e.to_string() }
    })?;

    let questions = parse_questions(&fs::read_to_string(&questions_path)?)
        .map_err(|reason| Error::Case { path: questions_path.clone(), reason })?;

    let relative_path = dir.strip_prefix(root).unwrap_or(dir).to_path_buf();
    let dir_name = dir.file_name().and_then(|s| s.to_str()).unwrap_or_default();

    Ok(Some(BenchmarkCase {
        relative_path,
        case_id: case_id_from_dir_name(dir_name),
        task_name: meta_field(&meta, "task_name"),
        task_id: meta_field(&meta, "uid"),
        questions,
    }))
}

/// Read a string or numeric field, falling back to `N/A`.
fn meta_field(meta: &Value, key: &str) -> String {
    match meta.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => UNKNOWN_FIELD.to_string(),
    }
}

/// Parse `auto_eval.jsonl`; blank lines are ignored.
fn parse_questions(content: &str) -> std::result::Result<Vec<Question>, String> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line.trim()).map_err(|e| format!("line {}: {e}", idx + 1))
        })
        .collect()
}
