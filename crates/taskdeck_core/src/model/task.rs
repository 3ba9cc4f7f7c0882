//! Task domain model.
//!
//! # Responsibility
//! - Define the task record, its closed enumerations and sub-tasks.
//! - Provide form-input (`TaskDraft`) and partial-update (`TaskPatch`) shapes.
//!
//! # Invariants
//! - `title` is non-blank for every task created through `TaskDraft`.
//! - `tags` hold trimmed, non-empty, unique values.
//! - `updated_at` is restamped by every applied patch.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Task identifier. Either assigned by the remote store or a local
/// temporary id (see [`TEMP_ID_PREFIX`]).
pub type TaskId = String;

/// Prefix marking ids synthesized locally while the backend was unreachable.
pub const TEMP_ID_PREFIX: &str = "temp_";

/// Returns whether `id` was synthesized locally and never reached the backend.
pub fn is_temporary_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

/// Builds a temporary id for a task created at `now_ms`.
pub fn temporary_id(now_ms: i64) -> TaskId {
    format!("{TEMP_ID_PREFIX}{now_ms}")
}

/// Closed set of task categories.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum TaskCategory {
    #[default]
    CodeTasks,
    Learning,
    Relationship,
    SelfDevelopment,
    ProjectImprovement,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 5] = [
        TaskCategory::CodeTasks,
        TaskCategory::Learning,
        TaskCategory::Relationship,
        TaskCategory::SelfDevelopment,
        TaskCategory::ProjectImprovement,
    ];

    /// Stable string id used in stored documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CodeTasks => "code-tasks",
            Self::Learning => "learning",
            Self::Relationship => "relationship",
            Self::SelfDevelopment => "self-development",
            Self::ProjectImprovement => "project-improvement",
        }
    }
}

/// Task severity, ordered from least to most pressing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
    Archived,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

/// Recurrence label. Descriptive only; nothing schedules from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Timeframe {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Checklist item nested inside a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: i64,
}

impl SubTask {
    pub fn new(title: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            completed: false,
            created_at: now_ms,
        }
    }
}

/// Canonical task record, serialized with the backend's camelCase names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: TaskCategory,
    pub priority: Priority,
    pub status: TaskStatus,
    /// Epoch milliseconds.
    #[serde(default, rename = "dueDate", skip_serializing_if = "Option::is_none")]
    pub due_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub user_id: String,
    #[serde(default)]
    pub subtasks: Vec<SubTask>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub timeframe: Timeframe,
}

impl Task {
    /// Returns whether this task only exists in the local mirror.
    pub fn is_unsynced(&self) -> bool {
        is_temporary_id(&self.id)
    }

    /// Due strictly before `now_ms` and not completed.
    pub fn is_overdue(&self, now_ms: i64) -> bool {
        match self.due_at {
            Some(due) => due < now_ms && self.status != TaskStatus::Completed,
            None => false,
        }
    }
}

/// Task validation errors raised before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "Please enter a task title"),
        }
    }
}

impl Error for TaskValidationError {}

/// New-task form input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub category: TaskCategory,
    pub priority: Priority,
    pub timeframe: Timeframe,
    pub due_at: Option<i64>,
    pub tags: Vec<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Checks required fields.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// Materializes the draft into a task owned by `user_id`.
    ///
    /// The returned task has an empty `id`; the caller assigns either the
    /// remote id or a temporary one.
    pub fn into_task(self, user_id: &str, now_ms: i64) -> Result<Task, TaskValidationError> {
        self.validate()?;
        Ok(Task {
            id: TaskId::new(),
            title: self.title.trim().to_string(),
            description: self.description,
            category: self.category,
            priority: self.priority,
            status: TaskStatus::Todo,
            due_at: self.due_at,
            created_at: now_ms,
            updated_at: now_ms,
            user_id: user_id.to_string(),
            subtasks: Vec::new(),
            tags: normalize_tags(&self.tags),
            timeframe: self.timeframe,
        })
    }
}

/// Trims tags, drops blanks and keeps the first occurrence of duplicates.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() || normalized.iter().any(|existing| existing == trimmed) {
            continue;
        }
        normalized.push(trimmed.to_string());
    }
    normalized
}

/// Partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<TaskCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// `Some(None)` clears the due date.
    #[serde(rename = "dueDate", skip_serializing_if = "Option::is_none")]
    pub due_at: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<SubTask>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn priority(priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            ..Self::default()
        }
    }

    /// Applies set fields and stamps `updated_at`.
    pub fn apply(&self, task: &mut Task, now_ms: i64) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(due_at) = self.due_at {
            task.due_at = due_at;
        }
        if let Some(subtasks) = &self.subtasks {
            task.subtasks = subtasks.clone();
        }
        if let Some(tags) = &self.tags {
            task.tags = normalize_tags(tags);
        }
        if let Some(timeframe) = self.timeframe {
            task.timeframe = timeframe;
        }
        task.updated_at = now_ms;
    }
}

/// Task list filter used by the list view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskFilter {
    /// Case-insensitive substring over title and description.
    pub search: String,
    /// `None` means every category.
    pub category: Option<TaskCategory>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = needle.is_empty()
            || task.title.to_lowercase().contains(&needle)
            || task.description.to_lowercase().contains(&needle);
        let matches_category = self
            .category
            .map_or(true, |category| task.category == category);
        matches_search && matches_category
    }
}
