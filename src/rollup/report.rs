//! Report types for rollup results.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::stats::Summary;

/// Percentage score of one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskScore {
    /// Task identifier.
    pub task_id: String,

    /// Task display name.
    pub task_name: String,

    /// Category the task was mapped to, if any.
    pub category: Option<String>,

    /// Number of cases averaged.
    pub cases: usize,

    /// Mean case score as a percentage of full credit.
    pub percentage: f64,

    /// Spread of case percentages.
    pub case_summary: Option<Summary>,
}

/// Percentage score of one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    /// Category name.
    pub name: String,

    /// Tasks that contributed.
    pub task_ids: Vec<String>,

    /// Unweighted mean of member task percentages (0 if no tasks).
    pub percentage: f64,
}

/// Result of a rollup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollupReport {
    /// Task scores ordered by task id.
    pub tasks: Vec<TaskScore>,

    /// Category scores in table order.
    pub categories: Vec<CategoryScore>,

    /// Unweighted mean of category percentages.
    pub overall: f64,

    /// Tasks with no category; they appear in `tasks` only.
    pub excluded_tasks: Vec<String>,

    /// When this report was generated.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl RollupReport {
    /// Look up a task by id.
    #[must_use]
    pub fn task(&self, task_id: &str) -> Option<&TaskScore> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    /// Look up a category by name.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Plain-text report: task scores, category scores, overall score.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Task Scores (Percentage):");
        for task in &self.tasks {
            let _ = writeln!(out, "Task {} ({}): {:.2}", task.task_id, task.task_name, task.percentage);
        }

        let _ = writeln!(out, "\nCategory Scores (Percentage):");
        for category in &self.categories {
            let _ = writeln!(out, "{}: {:.2}", category.name, category.percentage);
        }

        let _ = writeln!(out, "\nOverall Average Score: {:.2}", self.overall);

        if !self.excluded_tasks.is_empty() {
            let _ = writeln!(
                out,
                "\nExcluded from categories ({} task(s) without a category): {}",
                self.excluded_tasks.len(),
                self.excluded_tasks.join(", ")
            );
        }

        out
    }

    /// Per-task spread of case scores, one line per task.
    #[must_use]
    pub fn render_spread(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<8} {:>6} {:>8} {:>8} {:>8} {:>8}",
            "Task", "Cases", "Min", "Median", "Max", "StdDev"
        );
        let _ = writeln!(out, "{:-<52}", "");
        for task in &self.tasks {
            if let Some(s) = &task.case_summary {
                let _ = writeln!(
                    out,
                    "{:<8} {:>6} {:>8.2} {:>8.2} {:>8.2} {:>8.2}",
                    task.task_id, s.count, s.min, s.median, s.max, s.std_dev
                );
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RollupReport {
        RollupReport {
            tasks: vec![
                TaskScore {
                    task_id: "14".into(),
                    task_name: "Story".into(),
                    category: Some("T2Is".into()),
                    cases: 2,
                    percentage: 41.666_666,
                    case_summary: Summary::compute(&[33.333_333, 50.0]),
                },
                TaskScore {
                    task_id: "99".into(),
                    task_name: "Unlisted".into(),
                    category: None,
                    cases: 1,
                    percentage: 10.0,
                    case_summary: Summary::compute(&[10.0]),
                },
            ],
            categories: vec![CategoryScore {
                name: "T2Is".into(),
                task_ids: vec!["14".into()],
                percentage: 41.666_666,
            }],
            overall: 41.666_666,
            excluded_tasks: vec!["99".into()],
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_render_layout() {
        let text = sample().render();
        assert!(text.starts_with("Task Scores (Percentage):\nTask 14 (Story): 41.67\n"));
        assert!(text.contains("\nCategory Scores (Percentage):\nT2Is: 41.67\n"));
        assert!(text.contains("\nOverall Average Score: 41.67\n"));
        assert!(text.contains("1 task(s) without a category): 99"));
    }

    #[test]
    fn test_lookup() {
        let report = sample();
        assert_eq!(report.task("14").map(|t| t.cases), Some(2));
        assert!(report.category("T2Is").is_some());
        assert!(report.task("15").is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let report = sample();
        let json = serde_json::to_string(&report).unwrap();
        let back: RollupReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.excluded_tasks, report.excluded_tasks);
        assert_eq!(back.tasks.len(), 2);
    }
}
