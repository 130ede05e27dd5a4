//! Resumable scoring of a summary table.

use std::fs;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::{debug, info, warn};

use super::{CallResult, FailurePolicy, RowOutcome, ScorerConfig, ScoringModel, extract_score};
use crate::error::{Error, Result};

/// Columns appended to the summary header for `calls` model calls.
#[must_use]
pub fn result_columns(calls: usize) -> Vec<String> {
    (1..=calls)
        .flat_map(|i| [format!("gemini_result_{i}"), format!("score_{i}"), format!("explanation_{i}")])
        .collect()
}

/// Totals of a finished scoring run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRunSummary {
    /// Where results were written.
    pub output_path: PathBuf,
    /// Data rows in the summary table.
    pub total_rows: usize,
    /// Rows carried over from the resume file.
    pub resumed_rows: usize,
    /// Rows scored in this run.
    pub scored_rows: usize,
    /// Rows kept with empty cells after exhausting retries.
    pub failed_rows: usize,
}

/// Drives a [`ScoringModel`] over a summary table.
pub struct Scorer<M> {
    model: M,
    config: ScorerConfig,
}

impl<M: ScoringModel> Scorer<M> {
    /// Create a scorer.
    pub fn new(model: M, config: ScorerConfig) -> Self {
        Self { model, config }
    }

    /// Call the model until a reply parses or the attempts run out.
    ///
    /// Returns the last failure on exhaustion.
    pub fn score_call(&self, prompt: &str, image: &Path) -> std::result::Result<CallResult, String> {
        let attempts = self.config.max_retries;
        let mut last_failure = String::from("no attempts made");

        for attempt in 1..=attempts {
            match self.model.generate(prompt, image) {
                Ok(response) => match extract_score(&response) {
                    Some(parsed) => {
                        debug!(image = %image.display(), attempt, score = parsed.score, "scored");
                        return Ok(CallResult {
                            response,
                            score: parsed.score,
                            explanation: parsed.reason,
                        });
                    }
                    None => last_failure = "Score not found".to_string(),
                },
                Err(e) => last_failure = e.to_string(),
            }
            warn!(
                image = %image.display(),
                model = self.model.name(),
                "attempt {attempt}/{attempts} failed: {last_failure}"
            );
        }

        Err(last_failure)
    }

    /// Score one row `calls_per_row` times.
    ///
    /// `row` is the 1-based data row index, used in the outcome.
    pub fn score_row(&self, row: usize, prompt: &str, image: &Path) -> RowOutcome {
        let mut calls = Vec::with_capacity(self.config.calls_per_row);
        for _ in 0..self.config.calls_per_row {
            match self.score_call(prompt, image) {
                Ok(call) => calls.push(call),
                Err(reason) => {
                    return match self.config.failure_policy {
                        FailurePolicy::AbortBatch => RowOutcome::BatchAbort { row, reason },
                        FailurePolicy::SkipRow => RowOutcome::RowFailed { row, reason },
                    };
                }
            }
        }
        RowOutcome::Scored(calls)
    }

    /// Score every row of `summary` not already present in `resume`.
    ///
    /// Results always go to a fresh file: the resumed rows are copied over
    /// and new rows appended. The file is rewritten after every row.
    pub fn run(&self, summary: impl AsRef<Path>, resume: Option<&Path>) -> Result<ScoreRunSummary> {
        let summary = summary.as_ref();
        let mut reader = csv::Reader::from_path(summary)?;
        let summary_header = reader.headers()?.clone();
        let summary_rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

        let prompt_col = column_index(&summary_header, "text_prompt")?;
        let image_col = column_index(&summary_header, "stitched_image")?;

        let mut header = summary_header.clone();
        for column in result_columns(self.config.calls_per_row) {
            header.push_field(&column);
        }

        let mut processed = match resume {
            Some(path) if path.is_file() => load_resume(path, &header)?,
            Some(path) => {
                warn!(path = %path.display(), "resume file not found, starting from the beginning");
                Vec::new()
            }
            None => Vec::new(),
        };
        let resumed_rows = processed.len();

        let output_path = self.output_path();
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let pending = summary_rows.len().saturating_sub(resumed_rows);
        info!(
            total = summary_rows.len(),
            already_processed = resumed_rows,
            to_process = pending,
            output = %output_path.display(),
            "scoring"
        );

        let mut scored_rows = 0;
        let mut failed_rows = 0;
        for (idx, record) in summary_rows.iter().enumerate().skip(resumed_rows) {
            let row = idx + 1;
            let prompt = record.get(prompt_col).unwrap_or_default();
            let image = record.get(image_col).unwrap_or_default();

            let mut out = record.clone();
            match self.score_row(row, prompt, Path::new(image)) {
                RowOutcome::Scored(calls) => {
                    for call in calls {
                        out.push_field(&call.response);
                        out.push_field(&call.score.to_string());
                        out.push_field(&call.explanation);
                    }
                    scored_rows += 1;
                }
                RowOutcome::RowFailed { row, reason } => {
                    warn!(row, image, "retries exhausted, keeping row without scores: {reason}");
                    for _ in 0..3 * self.config.calls_per_row {
                        out.push_field("");
                    }
                    failed_rows += 1;
                }
                RowOutcome::BatchAbort { row, reason } => {
                    save_progress(&output_path, &header, &processed)?;
                    warn!(row, image, "retries exhausted, stopping: {reason}");
                    return Err(Error::BatchAborted {
                        row,
                        image: image.to_string(),
                        saved_to: output_path,
                    });
                }
            }

            processed.push(out);
            save_progress(&output_path, &header, &processed)?;
            info!(row, of = summary_rows.len(), "row done");
        }

        save_progress(&output_path, &header, &processed)?;
        info!(path = %output_path.display(), scored_rows, failed_rows, "results saved");

        Ok(ScoreRunSummary {
            output_path,
            total_rows: summary_rows.len(),
            resumed_rows,
            scored_rows,
            failed_rows,
        })
    }

    fn output_path(&self) -> PathBuf {
        self.config.output_path.clone().unwrap_or_else(|| {
            let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            self.config.output_dir.join(format!("gemini_results_{stamp}.csv"))
        })
    }
}

fn column_index(header: &StringRecord, name: &str) -> Result<usize> {
    header
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| Error::Config(format!("summary CSV has no {name:?} column")))
}

/// Load a previous results file, checking its header.
fn load_resume(path: &Path, expected: &StringRecord) -> Result<Vec<StringRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let found = reader.headers()?.clone();
    if &found != expected {
        return Err(Error::HeaderMismatch {
            expected: expected.iter().map(String::from).collect(),
            found: found.iter().map(String::from).collect(),
        });
    }
    info!(path = %path.display(), "resuming from existing file");
    Ok(reader.records().collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Rewrite the results file through a temporary sibling and a rename.
fn save_progress(path: &Path, header: &StringRecord, rows: &[StringRecord]) -> Result<()> {
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)?;
        writer.write_record(header)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::summary::{SummaryRow, write_summary};

    /// Replies with scripted answers, then with `fallback`.
    struct ScriptedModel {
        replies: RefCell<VecDeque<Result<String>>>,
        fallback: Option<String>,
        calls: RefCell<usize>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String>>, fallback: Option<&str>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                fallback: fallback.map(String::from),
                calls: RefCell::new(0),
            }
        }

        fn always(reply: &str) -> Self {
            Self::new(Vec::new(), Some(reply))
        }
    }

    impl ScoringModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        fn generate(&self, _prompt: &str, _image: &Path) -> Result<String> {
            *self.calls.borrow_mut() += 1;
            if let Some(reply) = self.replies.borrow_mut().pop_front() {
                return reply;
            }
            self.fallback
                .clone()
                .ok_or_else(|| Error::Model { model: "scripted".into(), message: "offline".into() })
        }
    }

    const GOOD: &str = r#"{"score": 1, "reason": "looks right"}"#;

    fn write_rows(dir: &Path, n: u32) -> PathBuf {
        let rows: Vec<_> = (1..=n)
            .map(|q| SummaryRow {
                task_name: "Story".into(),
                task_id: "14".into(),
                case_id: "0001".into(),
                question_id: q,
                text_prompt: format!("question {q}"),
                stitched_image: format!("panels/000{q}.jpg"),
            })
            .collect();
        let path = dir.join("summary.csv");
        write_summary(&path, &rows).unwrap();
        path
    }

    fn config(dir: &Path, retries: usize, policy: FailurePolicy) -> ScorerConfig {
        ScorerConfig::builder()
            .max_retries(retries)
            .failure_policy(policy)
            .output_path(dir.join("results.csv"))
            .build()
    }

    fn read_all(path: &Path) -> (StringRecord, Vec<StringRecord>) {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path).unwrap();
        let header = reader.headers().unwrap().clone();
        let rows = reader.records().map(|r| r.unwrap()).collect();
        (header, rows)
    }

    #[test]
    fn test_result_columns() {
        assert_eq!(
            result_columns(2),
            vec!["gemini_result_1", "score_1", "explanation_1", "gemini_result_2", "score_2", "explanation_2"]
        );
    }

    #[test]
    fn test_score_call_retries_until_parse() {
        let model = ScriptedModel::new(
            vec![
                Ok("I cannot tell".into()),
                Err(Error::Model { model: "scripted".into(), message: "503".into() }),
                Ok("```json\n{\"score\": 0, \"reason\": \"wrong colour\"}\n```".into()),
            ],
            None,
        );
        let scorer = Scorer::new(&model, ScorerConfig::default());
        let call = scorer.score_call("p", Path::new("x.jpg")).unwrap();
        assert_eq!(call.score, 0);
        assert_eq!(call.explanation, "wrong colour");
        assert_eq!(*model.calls.borrow(), 3);
    }

    #[test]
    fn test_score_call_gives_up() {
        let model = ScriptedModel::always("no score here");
        let scorer = Scorer::new(&model, ScorerConfig::builder().max_retries(4).build());
        let err = scorer.score_call("p", Path::new("x.jpg")).unwrap_err();
        assert_eq!(err, "Score not found");
        assert_eq!(*model.calls.borrow(), 4);
    }

    #[test]
    fn test_run_scores_every_row() {
        let tmp = tempfile::tempdir().unwrap();
        let summary = write_rows(tmp.path(), 2);
        let model = ScriptedModel::always(GOOD);
        let scorer = Scorer::new(&model, config(tmp.path(), 2, FailurePolicy::AbortBatch));

        let result = scorer.run(&summary, None).unwrap();
        assert_eq!(result.total_rows, 2);
        assert_eq!(result.scored_rows, 2);
        assert_eq!(*model.calls.borrow(), 6);

        let (header, rows) = read_all(&result.output_path);
        assert_eq!(header.len(), 15);
        assert_eq!(&header[6], "gemini_result_1");
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][7], "1");
        assert_eq!(&rows[1][14], "looks right");
        assert!(!tmp.path().join("results.csv.tmp").exists());
    }

    #[test]
    fn test_abort_saves_completed_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let summary = write_rows(tmp.path(), 3);
        // Row 1 succeeds (3 calls), row 2 fails on its first call.
        let model = ScriptedModel::new(vec![Ok(GOOD.into()), Ok(GOOD.into()), Ok(GOOD.into())], None);
        let scorer = Scorer::new(&model, config(tmp.path(), 2, FailurePolicy::AbortBatch));

        let err = scorer.run(&summary, None).unwrap_err();
        match err {
            Error::BatchAborted { row, image, saved_to } => {
                assert_eq!(row, 2);
                assert_eq!(image, "panels/0002.jpg");
                let (_, rows) = read_all(&saved_to);
                assert_eq!(rows.len(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_skip_row_keeps_alignment() {
        let tmp = tempfile::tempdir().unwrap();
        let summary = write_rows(tmp.path(), 2);
        let mut replies: Vec<Result<String>> =
            (0..2).map(|_| Err(Error::Model { model: "m".into(), message: "down".into() })).collect();
        replies.extend((0..3).map(|_| Ok(GOOD.to_string())));
        let model = ScriptedModel::new(replies, None);
        let scorer = Scorer::new(&model, config(tmp.path(), 2, FailurePolicy::SkipRow));

        let result = scorer.run(&summary, None).unwrap();
        assert_eq!(result.failed_rows, 1);
        assert_eq!(result.scored_rows, 1);

        let (_, rows) = read_all(&result.output_path);
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][7], "");
        assert_eq!(&rows[1][7], "1");
    }

    #[test]
    fn test_resume_skips_processed_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let summary = write_rows(tmp.path(), 3);

        // First pass: only the first row gets through.
        let model = ScriptedModel::new((0..3).map(|_| Ok(GOOD.to_string())).collect(), None);
        let first = Scorer::new(&model, config(tmp.path(), 1, FailurePolicy::AbortBatch));
        let Err(Error::BatchAborted { saved_to, .. }) = first.run(&summary, None) else {
            panic!("expected abort");
        };

        let model = ScriptedModel::always(r#"{'score': 0, 'reason': 'off'}"#);
        let config = ScorerConfig::builder().output_path(tmp.path().join("resumed.csv")).build();
        let result = Scorer::new(&model, config).run(&summary, Some(&saved_to)).unwrap();
        assert_eq!(result.resumed_rows, 1);
        assert_eq!(result.scored_rows, 2);
        assert_eq!(*model.calls.borrow(), 6);

        let (_, rows) = read_all(&result.output_path);
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][7], "1");
        assert_eq!(&rows[2][7], "0");
    }

    #[test]
    fn test_resume_header_mismatch() {
        let tmp = tempfile::tempdir().unwrap();
        let summary = write_rows(tmp.path(), 1);
        let resume = tmp.path().join("old.csv");
        fs::write(&resume, "a,b,c\n1,2,3\n").unwrap();

        let model = ScriptedModel::always(GOOD);
        let scorer = Scorer::new(&model, config(tmp.path(), 1, FailurePolicy::AbortBatch));
        let err = scorer.run(&summary, Some(&resume)).unwrap_err();
        assert!(matches!(err, Error::HeaderMismatch { .. }));
        assert_eq!(*model.calls.borrow(), 0);
    }

    #[test]
    fn test_missing_resume_file_starts_fresh() {
        let tmp = tempfile::tempdir().unwrap();
        let summary = write_rows(tmp.path(), 1);
        let model = ScriptedModel::always(GOOD);
        let scorer = Scorer::new(&model, config(tmp.path(), 1, FailurePolicy::AbortBatch));
        let result = scorer.run(&summary, Some(&tmp.path().join("missing.csv"))).unwrap();
        assert_eq!(result.resumed_rows, 0);
        assert_eq!(result.scored_rows, 1);
    }

    #[test]
    fn test_timestamped_output_name() {
        let tmp = tempfile::tempdir().unwrap();
        let scorer = Scorer::new(
            ScriptedModel::always(GOOD),
            ScorerConfig::builder().output_dir(tmp.path()).build(),
        );
        let path = scorer.output_path();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("gemini_results_"));
        assert_eq!(name.len(), "gemini_results_20250101_120000.csv".len());
        assert_eq!(path.parent(), Some(tmp.path()));
    }
}
