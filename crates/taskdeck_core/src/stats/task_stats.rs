//! Task statistics aggregator.
//!
//! # Invariants
//! - `by_category` and `by_priority` always contain every key of their closed
//!   set and each sums to `total`.
//! - `overdue <= total - completed`.
//! - `compute_stats` is pure: same input and instant, same output.

use crate::model::task::{Priority, Task, TaskCategory, TaskStatus};
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary counts over one task collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub overdue: usize,
    pub by_category: BTreeMap<TaskCategory, usize>,
    pub by_priority: BTreeMap<Priority, usize>,
}

impl Default for TaskStats {
    fn default() -> Self {
        Self {
            total: 0,
            completed: 0,
            in_progress: 0,
            overdue: 0,
            by_category: TaskCategory::ALL.iter().map(|c| (*c, 0)).collect(),
            by_priority: Priority::ALL.iter().map(|p| (*p, 0)).collect(),
        }
    }
}

impl TaskStats {
    /// Completed share as a rounded percentage; 0 for an empty collection.
    pub fn completion_rate(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u32
    }

    pub fn category_count(&self, category: TaskCategory) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }

    pub fn priority_count(&self, priority: Priority) -> usize {
        self.by_priority.get(&priority).copied().unwrap_or(0)
    }
}

/// Computes statistics for `tasks` as seen at `now_ms`.
pub fn compute_stats(tasks: &[Task], now_ms: i64) -> TaskStats {
    let mut stats = TaskStats {
        total: tasks.len(),
        ..TaskStats::default()
    };

    for task in tasks {
        match task.status {
            TaskStatus::Completed => stats.completed += 1,
            TaskStatus::InProgress => stats.in_progress += 1,
            TaskStatus::Todo | TaskStatus::Archived => {}
        }
        if task.is_overdue(now_ms) {
            stats.overdue += 1;
        }
        *stats.by_category.entry(task.category).or_insert(0) += 1;
        *stats.by_priority.entry(task.priority).or_insert(0) += 1;
    }

    stats
}
