//! Benchmark category table.
//!
//! Categories partition task ids into the buckets used for top-level
//! reporting. The table is a plain value handed to the rollup, so alternate
//! benchmark layouts can be loaded from JSON or built in tests.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The five categories of the stock benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BenchmarkCategory {
    /// Text prompt to a single image.
    T2I,
    /// Single image to single image.
    I2I,
    /// Several images to a single image.
    Is2I,
    /// Text prompt to several images.
    T2Is,
    /// Several images to several images.
    Is2Is,
}

impl BenchmarkCategory {
    /// All categories in reporting order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::T2I, Self::I2I, Self::Is2I, Self::T2Is, Self::Is2Is]
    }

    /// Task ids that belong to this category in the stock benchmark.
    #[must_use]
    pub fn task_ids(self) -> &'static [&'static str] {
        match self {
            Self::T2I => &["24", "26", "28"],
            Self::I2I => &["63", "72"],
            Self::Is2I => &["64", "65", "73"],
            Self::T2Is => &["14", "15", "16", "17"],
            Self::Is2Is => &["44", "45", "46", "49"],
        }
    }
}

impl std::fmt::Display for BenchmarkCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::T2I => write!(f, "T2I"),
            Self::I2I => write!(f, "I2I"),
            Self::Is2I => write!(f, "Is2I"),
            Self::T2Is => write!(f, "T2Is"),
            Self::Is2Is => write!(f, "Is2Is"),
        }
    }
}

/// One named bucket of task ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Display name.
    pub name: String,
    /// Task ids mapped into this category.
    pub task_ids: BTreeSet<String>,
}

/// Ordered mapping of categories to task ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryTable {
    entries: Vec<CategoryEntry>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::benchmark()
    }
}

impl CategoryTable {
    /// The stock five-category benchmark table.
    #[must_use]
    pub fn benchmark() -> Self {
        let entries = BenchmarkCategory::all()
            .iter()
            .map(|cat| CategoryEntry {
                name: cat.to_string(),
                task_ids: cat.task_ids().iter().map(|id| (*id).to_string()).collect(),
            })
            .collect();
        Self { entries }
    }

    /// Build a table from entries, rejecting a task id listed twice.
    pub fn new(entries: Vec<CategoryEntry>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for entry in &entries {
            for id in &entry.task_ids {
                if !seen.insert(id.as_str()) {
                    return Err(Error::Config(format!(
                        "task id {id} is mapped to more than one category"
                    )));
                }
            }
        }
        Ok(Self { entries })
    }

    /// Load a table from a JSON file (`[{"name": .., "task_ids": [..]}, ..]`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let entries: Vec<CategoryEntry> = serde_json::from_str(&content)?;
        Self::new(entries)
    }

    /// Categories in reporting order.
    #[must_use]
    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no categories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of the category a task id belongs to.
    #[must_use]
    pub fn category_of(&self, task_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.task_ids.contains(task_id))
            .map(|entry| entry.name.as_str())
    }
}
