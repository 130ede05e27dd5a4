//! Gated case scoring and the task/category rollup.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::{CategoryScore, RollupConfig, RollupReport, ScoredRow, TaskScore};
use crate::stats::{Summary, mean};

/// Score one case for one API call.
///
/// Questions are ordered by id first. If either of the first two scores is
/// zero, questions 3-6 are zeroed; otherwise if either of questions 3-4 is
/// zero, questions 5-6 are zeroed. The result is the mean of all scores.
#[must_use]
pub fn gate_case_scores(scores: &[(u32, u32)]) -> f64 {
    let mut ordered = scores.to_vec();
    ordered.sort_by_key(|&(question_id, _)| question_id);

    let mut values: Vec<f64> = ordered.iter().map(|&(_, score)| f64::from(score)).collect();
    let failed = |v: &[f64], range: std::ops::Range<usize>| {
        range.into_iter().any(|i| v.get(i).is_some_and(|s| *s == 0.0))
    };

    if failed(&values, 0..2) {
        values.iter_mut().skip(2).for_each(|s| *s = 0.0);
    } else if failed(&values, 2..4) {
        values.iter_mut().skip(4).for_each(|s| *s = 0.0);
    }

    mean(&values)
}

/// Roll validated rows up into task, category and overall scores.
#[must_use]
pub fn rollup(rows: &[ScoredRow], config: &RollupConfig) -> RollupReport {
    let mut cases: BTreeMap<(&str, &str), Vec<&ScoredRow>> = BTreeMap::new();
    let mut task_names: BTreeMap<&str, &str> = BTreeMap::new();
    for row in rows {
        cases.entry((row.task_id.as_str(), row.case_id.as_str())).or_default().push(row);
        task_names.insert(&row.task_id, &row.task_name);
    }

    let mut case_scores: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (&(task_id, case_id), questions) in &cases {
        let per_call: Vec<f64> = (0..config.calls_per_row())
            .map(|call| {
                let pairs: Vec<(u32, u32)> = questions
                    .iter()
                    .map(|q| (q.question_id, q.scores.get(call).copied().unwrap_or(0)))
                    .collect();
                gate_case_scores(&pairs)
            })
            .collect();
        let score = mean(&per_call);
        debug!(task_id, case_id, score, "case scored");
        case_scores.entry(task_id).or_default().push(score);
    }

    let scale = 100.0 / f64::from(config.max_score.max(1));
    let tasks: Vec<TaskScore> = case_scores
        .iter()
        .map(|(task_id, scores)| {
            let percentages: Vec<f64> = scores.iter().map(|s| s * scale).collect();
            TaskScore {
                task_id: (*task_id).to_string(),
                task_name: task_names.get(task_id).copied().unwrap_or_default().to_string(),
                category: config.categories.category_of(task_id).map(String::from),
                cases: scores.len(),
                percentage: mean(scores) * scale,
                case_summary: Summary::compute(&percentages),
            }
        })
        .collect();

    let categories: Vec<CategoryScore> = config
        .categories
        .entries()
        .iter()
        .map(|entry| {
            let members: Vec<&TaskScore> = tasks
                .iter()
                .filter(|t| entry.task_ids.contains(&t.task_id))
                .collect();
            let percentages: Vec<f64> = members.iter().map(|t| t.percentage).collect();
            CategoryScore {
                name: entry.name.clone(),
                task_ids: members.iter().map(|t| t.task_id.clone()).collect(),
                percentage: mean(&percentages),
            }
        })
        .collect();

    let excluded_tasks: Vec<String> = tasks
        .iter()
        .filter(|t| t.category.is_none())
        .map(|t| t.task_id.clone())
        .collect();
    if !excluded_tasks.is_empty() {
        warn!(
            count = excluded_tasks.len(),
            tasks = ?excluded_tasks,
            "tasks without a category are excluded from category scores"
        );
    }

    let category_percentages: Vec<f64> = categories.iter().map(|c| c.percentage).collect();

    RollupReport {
        tasks,
        overall: mean(&category_percentages),
        categories,
        excluded_tasks,
        timestamp: chrono::Utc::now(),
    }
}
