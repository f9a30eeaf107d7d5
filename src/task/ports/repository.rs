//! Repository port for tasks, blocker edges and learnings.

use crate::task::domain::{
    BookmarkName, GraphSnapshot, GraphViolation, Learning, LearningId, PositionRef, Task, TaskId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Storage-level listing filter.
///
/// The repository applies the parent, completion and archive filters.
/// Depth and readiness depend on the whole graph and are applied by the
/// service on top of a fresh snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only direct children of this task.
    pub parent_id: Option<TaskId>,
    /// Only completed (`Some(true)`) or not completed (`Some(false)`) tasks.
    pub completed: Option<bool>,
    /// Include archived tasks.
    pub include_archived: bool,
    /// Only tasks at this depth.
    pub depth: Option<usize>,
    /// Only active tasks that are not effectively blocked.
    pub ready: bool,
}

impl TaskFilter {
    /// Creates a filter matching every non-archived task.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the listing to children of `parent_id`.
    #[must_use]
    pub const fn with_parent(mut self, parent_id: TaskId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Restricts the listing by completion flag.
    #[must_use]
    pub const fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Includes archived tasks.
    #[must_use]
    pub const fn including_archived(mut self) -> Self {
        self.include_archived = true;
        self
    }

    /// Restricts the listing to one hierarchy level.
    #[must_use]
    pub const fn with_depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Restricts the listing to tasks ready for work.
    #[must_use]
    pub const fn ready_only(mut self) -> Self {
        self.ready = true;
        self
    }

    /// Returns `true` when `task` passes the storage-level part of the
    /// filter.
    #[must_use]
    pub fn matches_stored(&self, task: &Task) -> bool {
        let lifecycle = task.lifecycle();
        let parent_ok = self
            .parent_id
            .is_none_or(|parent| task.parent_id() == Some(parent));
        let completed_ok = self
            .completed
            .is_none_or(|completed| lifecycle.is_completed() == completed);
        let archived_ok = self.include_archived || !lifecycle.is_archived();
        parent_ok && completed_ok && archived_ok
    }
}

/// Task persistence contract.
///
/// Structural writes (`insert`, `reparent`, `add_blocker`) re-validate the
/// change against a snapshot read inside the same critical section or
/// transaction as the write.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Lists tasks matching the storage-level part of `filter`, most urgent
    /// first and then in creation order.
    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the direct children of a task.
    async fn find_children(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns every descendant of a task, breadth first.
    async fn find_descendants(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the tasks `id` is blocked by.
    async fn find_blockers(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskId>>;

    /// Returns the tasks blocked by `id`.
    async fn find_blocking(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskId>>;

    /// Reads a fresh snapshot of the whole graph.
    async fn snapshot(&self) -> TaskRepositoryResult<GraphSnapshot>;

    /// Inserts a new task with its initial blockers.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the identifier is
    /// taken and [`TaskRepositoryError::Structural`] when the placement or
    /// blockers are invalid.
    async fn insert(&self, task: &Task, blocked_by: &[TaskId]) -> TaskRepositoryResult<()>;

    /// Re-reads a task, applies `apply` to it and persists the result as one
    /// atomic step.
    ///
    /// The read, the closure and the write happen under the adapter's write
    /// lock, so a transition is always validated against the stored state
    /// and never overwrites a concurrent change. Nothing is written when
    /// `apply` fails. The parent is not persisted; use [`Self::reparent`].
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or [`TaskRepositoryError::NotFound`]
    /// converted into `E` when the task does not exist.
    async fn modify<F, E>(&self, id: TaskId, apply: F) -> Result<Task, E>
    where
        F: FnOnce(&mut Task) -> Result<(), E> + Send + 'static,
        E: From<TaskRepositoryError> + Send + 'static;

    /// Like [`Self::modify`] for a task together with all of its
    /// descendants. Returns the modified task.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or [`TaskRepositoryError::NotFound`]
    /// converted into `E` when the task does not exist. Nothing is written
    /// on failure.
    async fn modify_subtree<F, E>(&self, id: TaskId, apply: F) -> Result<Task, E>
    where
        F: FnOnce(&mut Task, &mut [Task]) -> Result<(), E> + Send + 'static,
        E: From<TaskRepositoryError> + Send + 'static;

    /// Moves a task under another parent, or to the root level, validating
    /// the move first. Only the parent and `updated_at` are written.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] for unknown tasks and
    /// [`TaskRepositoryError::Structural`] when the move is invalid.
    async fn reparent(
        &self,
        task_id: TaskId,
        parent_id: Option<TaskId>,
        moved_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<()>;

    /// Adds a blocker edge. Adding an existing edge is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Structural`] when the edge is invalid.
    async fn add_blocker(&self, task_id: TaskId, blocker_id: TaskId) -> TaskRepositoryResult<()>;

    /// Removes a blocker edge. Returns `false` when no such edge existed.
    async fn remove_blocker(&self, task_id: TaskId, blocker_id: TaskId)
    -> TaskRepositoryResult<bool>;

    /// Deletes a task, its descendants, their learnings and every blocker
    /// edge touching them. Returns the removed task identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist.
    async fn delete_cascade(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskId>>;

    /// Records the bookmark and start revision of a started task.
    async fn set_bookmark(
        &self,
        id: TaskId,
        bookmark: &BookmarkName,
        start_commit: Option<&PositionRef>,
    ) -> TaskRepositoryResult<()>;

    /// Forgets the recorded bookmark of a task.
    async fn clear_bookmark(&self, id: TaskId) -> TaskRepositoryResult<()>;

    /// Stores a learning on its holder task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the holder does not
    /// exist.
    async fn attach_learning(&self, learning: &Learning) -> TaskRepositoryResult<()>;

    /// Lists learnings held by a task in creation order.
    async fn list_learnings(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Learning>>;

    /// Finds a learning by identifier.
    async fn find_learning(&self, id: LearningId) -> TaskRepositoryResult<Option<Learning>>;

    /// Deletes a learning.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::LearningNotFound`] when it does not
    /// exist.
    async fn delete_learning(&self, id: LearningId) -> TaskRepositoryResult<()>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The learning was not found.
    #[error("learning not found: {0}")]
    LearningNotFound(LearningId),

    /// The structural change failed validation against the stored graph.
    #[error(transparent)]
    Structural(#[from] GraphViolation),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
