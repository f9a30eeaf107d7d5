//! Read model returned to callers.

use super::{
    BookmarkName, ContextChain, GraphSnapshot, InheritedLearnings, LifecycleState, PositionRef,
    Priority, Task, TaskId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task representation with every stored field plus derived status.
///
/// `context_chain` and `learnings` are only filled for single-item
/// retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    /// Task identifier.
    pub id: TaskId,
    /// Parent identifier.
    pub parent_id: Option<TaskId>,
    /// Description.
    pub description: String,
    /// The task's own context.
    pub context: String,
    /// Completion result.
    pub result: Option<String>,
    /// Scheduling priority.
    pub priority: Priority,
    /// Derived depth in the hierarchy.
    pub depth: usize,
    /// Derived lifecycle state.
    pub state: LifecycleState,
    /// Whether work has started.
    pub started: bool,
    /// Whether the task is completed.
    pub completed: bool,
    /// Whether the task is cancelled.
    pub cancelled: bool,
    /// Whether the task is archived.
    pub archived: bool,
    /// When work started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the task was completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the task was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// When the task was archived.
    pub archived_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Bookmark created when work started.
    pub bookmark: Option<BookmarkName>,
    /// Revision recorded when work started.
    pub start_commit: Option<PositionRef>,
    /// Revision recorded at completion.
    pub commit_sha: Option<PositionRef>,
    /// Tasks this task is blocked by.
    pub blocked_by: Vec<TaskId>,
    /// Tasks blocked by this task.
    pub blocks: Vec<TaskId>,
    /// Whether the task or an ancestor has an unsatisfied blocker.
    pub effectively_blocked: bool,
    /// Inherited context, single-item retrieval only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_chain: Option<ContextChain>,
    /// Inherited learnings, single-item retrieval only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learnings: Option<InheritedLearnings>,
}

impl TaskView {
    /// Builds the list representation of `task` using derived facts from
    /// `snapshot`.
    #[must_use]
    pub fn new(task: &Task, snapshot: &GraphSnapshot) -> Self {
        let id = task.id();
        let lifecycle = task.lifecycle();
        Self {
            id,
            parent_id: task.parent_id(),
            description: task.description().to_owned(),
            context: task.context().to_owned(),
            result: task.result().map(str::to_owned),
            priority: task.priority(),
            depth: snapshot.compute_depth(id),
            state: lifecycle.state(),
            started: lifecycle.is_started(),
            completed: lifecycle.is_completed(),
            cancelled: lifecycle.is_cancelled(),
            archived: lifecycle.is_archived(),
            started_at: lifecycle.started_at,
            completed_at: lifecycle.completed_at,
            cancelled_at: lifecycle.cancelled_at,
            archived_at: lifecycle.archived_at,
            created_at: task.created_at(),
            updated_at: task.updated_at(),
            bookmark: task.bookmark().cloned(),
            start_commit: task.start_commit().cloned(),
            commit_sha: task.commit_sha().cloned(),
            blocked_by: snapshot.blockers_of(id),
            blocks: snapshot.blocking(id),
            effectively_blocked: snapshot.is_effectively_blocked(id),
            context_chain: None,
            learnings: None,
        }
    }

    /// Adds inherited context and learnings for single-item retrieval.
    #[must_use]
    pub fn with_details(mut self, context_chain: ContextChain, learnings: InheritedLearnings) -> Self {
        self.context_chain = Some(context_chain);
        self.learnings = Some(learnings);
        self
    }
}
