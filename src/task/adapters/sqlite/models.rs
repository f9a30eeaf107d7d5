//! Diesel row models for task persistence.

use super::schema::{learnings, task_blockers, tasks};
use diesel::prelude::*;

/// Task row used for reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaskRow {
    /// Task identifier.
    pub id: String,
    /// Parent task identifier.
    pub parent_id: Option<String>,
    /// Short description.
    pub description: String,
    /// Own context text.
    pub context: String,
    /// Completion result.
    pub result: Option<String>,
    /// Priority value.
    pub priority: i32,
    /// Start timestamp.
    pub started_at: Option<String>,
    /// Completion timestamp.
    pub completed_at: Option<String>,
    /// Cancellation timestamp.
    pub cancelled_at: Option<String>,
    /// Archive timestamp.
    pub archived_at: Option<String>,
    /// Bookmark name.
    pub bookmark: Option<String>,
    /// Revision recorded at start.
    pub start_commit: Option<String>,
    /// Revision recorded at completion.
    pub commit_sha: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Changeset for every mutable column except the parent.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskChanges {
    /// Short description.
    pub description: String,
    /// Own context text.
    pub context: String,
    /// Completion result.
    pub result: Option<String>,
    /// Priority value.
    pub priority: i32,
    /// Start timestamp.
    pub started_at: Option<String>,
    /// Completion timestamp.
    pub completed_at: Option<String>,
    /// Cancellation timestamp.
    pub cancelled_at: Option<String>,
    /// Archive timestamp.
    pub archived_at: Option<String>,
    /// Bookmark name.
    pub bookmark: Option<String>,
    /// Revision recorded at start.
    pub start_commit: Option<String>,
    /// Revision recorded at completion.
    pub commit_sha: Option<String>,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Blocker edge row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_blockers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BlockerRow {
    /// Blocked task.
    pub task_id: String,
    /// Blocking task.
    pub blocker_id: String,
}

/// Learning row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = learnings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LearningRow {
    /// Learning identifier.
    pub id: String,
    /// Holder task.
    pub task_id: String,
    /// Note text.
    pub content: String,
    /// Authoring task.
    pub source_task_id: String,
    /// Creation timestamp.
    pub created_at: String,
}
