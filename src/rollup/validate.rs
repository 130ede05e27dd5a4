//! Pre-flight validation of scored CSV records.

use std::collections::{BTreeMap, BTreeSet};

use csv::StringRecord;

use super::{RollupConfig, ScoredRow, Violation};
use crate::error::{Error, Result};

/// Check every record and return all problems found.
///
/// A wrong row count is reported on its own, before any cell is inspected.
#[must_use]
pub fn validate(records: &[StringRecord], config: &RollupConfig) -> Vec<Violation> {
    if let Some(expected) = config.expected_rows {
        if records.len() != expected {
            return vec![Violation::RowCount { expected, found: records.len() }];
        }
    }

    let columns = &config.columns;
    let min_len = columns.min_len();
    let mut violations = Vec::new();
    let mut cases: BTreeMap<(&str, &str), (usize, BTreeSet<u32>)> = BTreeMap::new();

    for (idx, record) in records.iter().enumerate() {
        let line = idx + 2;

        if record.len() < min_len {
            violations.push(Violation::MissingColumns { line, found: record.len() });
            continue;
        }

        for &column in &columns.scores {
            let cell = &record[column];
            match parse_score(cell) {
                Some(value) if value > config.max_score => {
                    violations.push(Violation::ScoreOutOfRange {
                        line,
                        value,
                        max: config.max_score,
                    });
                }
                Some(_) => {}
                None => violations.push(Violation::NonNumericScore {
                    line,
                    column,
                    value: cell.to_string(),
                }),
            }
        }

        let question = &record[columns.question_id];
        match question.trim().parse::<u32>() {
            Ok(qid) if qid > 0 => {
                let entry = cases
                    .entry((&record[columns.task_id], &record[columns.case_id]))
                    .or_default();
                entry.0 += 1;
                entry.1.insert(qid);
            }
            _ => violations.push(Violation::InvalidQuestionId {
                line,
                value: question.to_string(),
            }),
        }
    }

    let expected = config.questions_per_case;
    for ((task_id, case_id), (rows, questions)) in cases {
        if rows != expected || questions.len() != expected {
            let found = if rows == expected { questions.len() } else { rows };
            violations.push(Violation::IncompleteCase {
                task_id: task_id.to_string(),
                case_id: case_id.to_string(),
                found,
                expected,
            });
        }
    }

    violations
}

/// Validate records and convert them into typed rows.
pub fn parse_rows(records: &[StringRecord], config: &RollupConfig) -> Result<Vec<ScoredRow>> {
    let violations = validate(records, config);
    if !violations.is_empty() {
        return Err(Error::Validation(violations));
    }

    let columns = &config.columns;
    let rows = records
        .iter()
        .map(|record| ScoredRow {
            task_name: record[columns.task_name].to_string(),
            task_id: record[columns.task_id].to_string(),
            case_id: record[columns.case_id].to_string(),
            question_id: record[columns.question_id].trim().parse().unwrap_or_default(),
            scores: columns
                .scores
                .iter()
                .map(|&c| parse_score(&record[c]).unwrap_or_default())
                .collect(),
        })
        .collect();

    Ok(rows)
}

/// A score cell must be a plain run of ASCII digits.
fn parse_score(cell: &str) -> Option<u32> {
    if cell.is_empty() || !cell.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    cell.parse().ok()
}
