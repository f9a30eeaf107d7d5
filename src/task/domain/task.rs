//! Task aggregate root and its lifecycle transitions.

use super::{
    BookmarkName, LifecycleState, LifecycleTimestamps, PositionRef, Priority, TaskDomainError,
    TaskId, TransitionError,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Task aggregate root.
///
/// Hierarchy depth and blocker edges live outside the aggregate: depth is
/// always derived from the parent chain and blocker edges are owned by the
/// repository so they can be validated against the whole graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    parent_id: Option<TaskId>,
    description: String,
    context: String,
    result: Option<String>,
    priority: Priority,
    lifecycle: LifecycleTimestamps,
    bookmark: Option<BookmarkName>,
    start_commit: Option<PositionRef>,
    commit_sha: Option<PositionRef>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Validated input for a brand-new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskData {
    /// Parent task, if any.
    pub parent_id: Option<TaskId>,
    /// Short description of the work.
    pub description: String,
    /// Free-form context handed to whoever picks the task up.
    pub context: String,
    /// Scheduling priority.
    pub priority: Priority,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted parent identifier.
    pub parent_id: Option<TaskId>,
    /// Persisted description.
    pub description: String,
    /// Persisted context.
    pub context: String,
    /// Persisted completion result.
    pub result: Option<String>,
    /// Persisted priority.
    pub priority: Priority,
    /// Persisted lifecycle timestamps.
    pub lifecycle: LifecycleTimestamps,
    /// Persisted bookmark, if any.
    pub bookmark: Option<BookmarkName>,
    /// Persisted revision recorded at start.
    pub start_commit: Option<PositionRef>,
    /// Persisted revision recorded at completion.
    pub commit_sha: Option<PositionRef>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new pending task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyDescription`] when the description is
    /// blank.
    pub fn new(data: NewTaskData, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let description = normalize_description(data.description)?;
        let timestamp = clock.utc();

        Ok(Self {
            id: TaskId::new(),
            parent_id: data.parent_id,
            description,
            context: data.context,
            result: None,
            priority: data.priority,
            lifecycle: LifecycleTimestamps::default(),
            bookmark: None,
            start_commit: None,
            commit_sha: None,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            parent_id: data.parent_id,
            description: data.description,
            context: data.context,
            result: data.result,
            priority: data.priority,
            lifecycle: data.lifecycle,
            bookmark: data.bookmark,
            start_commit: data.start_commit,
            commit_sha: data.commit_sha,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the stored fields as a persistence parameter object.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedTaskData {
        PersistedTaskData {
            id: self.id,
            parent_id: self.parent_id,
            description: self.description.clone(),
            context: self.context.clone(),
            result: self.result.clone(),
            priority: self.priority,
            lifecycle: self.lifecycle,
            bookmark: self.bookmark.clone(),
            start_commit: self.start_commit.clone(),
            commit_sha: self.commit_sha.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the parent identifier, if any.
    #[must_use]
    pub const fn parent_id(&self) -> Option<TaskId> {
        self.parent_id
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the task's own context text.
    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Returns the completion result, if any.
    #[must_use]
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Returns the scheduling priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the lifecycle timestamps.
    #[must_use]
    pub const fn lifecycle(&self) -> &LifecycleTimestamps {
        &self.lifecycle
    }

    /// Returns the derived lifecycle state.
    #[must_use]
    pub const fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Returns the bookmark created when work started, if still recorded.
    #[must_use]
    pub const fn bookmark(&self) -> Option<&BookmarkName> {
        self.bookmark.as_ref()
    }

    /// Returns the revision recorded when work started.
    #[must_use]
    pub const fn start_commit(&self) -> Option<&PositionRef> {
        self.start_commit.as_ref()
    }

    /// Returns the revision recorded at completion.
    #[must_use]
    pub const fn commit_sha(&self) -> Option<&PositionRef> {
        self.commit_sha.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Rejects any mutation of an archived task.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::ArchivedImmutable`] when archived.
    pub fn ensure_mutable(&self) -> Result<(), TransitionError> {
        if self.lifecycle.is_archived() {
            return Err(TransitionError::ArchivedImmutable {
                task_id: self.id,
                state: self.lifecycle_state(),
            });
        }
        Ok(())
    }

    /// Replaces the description.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyDescription`] for blank input.
    pub fn set_description(
        &mut self,
        description: String,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.description = normalize_description(description)?;
        self.touch(clock);
        Ok(())
    }

    /// Replaces the task's own context.
    pub fn set_context(&mut self, context: String, clock: &impl Clock) {
        self.context = context;
        self.touch(clock);
    }

    /// Replaces the priority.
    pub fn set_priority(&mut self, priority: Priority, clock: &impl Clock) {
        self.priority = priority;
        self.touch(clock);
    }

    /// Moves the task under another parent, or to the root level.
    ///
    /// Structural validity is checked by the graph validator before the
    /// change is persisted.
    pub const fn set_parent(&mut self, parent_id: Option<TaskId>, moved_at: DateTime<Utc>) {
        self.parent_id = parent_id;
        self.updated_at = moved_at;
    }

    /// Checks that work on the task may begin or continue.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::ArchivedImmutable`] for archived tasks and
    /// [`TransitionError::CannotStartFinished`] for completed or cancelled
    /// tasks.
    pub fn ensure_startable(&self) -> Result<(), TransitionError> {
        self.ensure_mutable()?;
        if self.lifecycle.is_finished_for_hierarchy() {
            return Err(TransitionError::CannotStartFinished {
                task_id: self.id,
                state: self.lifecycle_state(),
            });
        }
        Ok(())
    }

    /// Marks work as started.
    ///
    /// Returns `false` when the task was already started, leaving it
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Self::ensure_startable`].
    pub fn start(&mut self, clock: &impl Clock) -> Result<bool, TransitionError> {
        self.ensure_startable()?;
        if self.lifecycle.is_started() {
            return Ok(false);
        }
        let timestamp = clock.utc();
        self.lifecycle.started_at = Some(timestamp);
        self.updated_at = timestamp;
        Ok(true)
    }

    /// Records the bookmark and revision captured when work started.
    pub fn record_start_position(
        &mut self,
        bookmark: Option<BookmarkName>,
        start_commit: Option<PositionRef>,
    ) {
        if bookmark.is_some() {
            self.bookmark = bookmark;
        }
        if start_commit.is_some() {
            self.start_commit = start_commit;
        }
    }

    /// Checks that the task may be completed.
    ///
    /// Completing an already-completed task is a no-op and passes this check.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::ArchivedImmutable`] for archived tasks and
    /// [`TransitionError::CannotCompleteCancelled`] for cancelled tasks.
    pub fn ensure_completable(&self) -> Result<(), TransitionError> {
        self.ensure_mutable()?;
        if self.lifecycle.is_cancelled() {
            return Err(TransitionError::CannotCompleteCancelled {
                task_id: self.id,
                state: self.lifecycle_state(),
            });
        }
        Ok(())
    }

    /// Marks the task completed with an optional result and the revision the
    /// work landed on.
    ///
    /// A pending task passes through `in_progress` so `started_at` is always
    /// set on a completed task.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Self::ensure_completable`].
    pub fn complete(
        &mut self,
        result: Option<String>,
        commit_sha: Option<PositionRef>,
        clock: &impl Clock,
    ) -> Result<(), TransitionError> {
        self.ensure_completable()?;
        if self.lifecycle.is_completed() {
            return Ok(());
        }
        let timestamp = clock.utc();
        if self.lifecycle.started_at.is_none() {
            self.lifecycle.started_at = Some(timestamp);
        }
        self.lifecycle.completed_at = Some(timestamp);
        self.result = result;
        self.commit_sha = commit_sha;
        self.updated_at = timestamp;
        Ok(())
    }

    /// Cancels a pending or in-progress task. Children are not affected.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::CannotCancelCompleted`] when the task was
    /// completed (archived or not) and [`TransitionError::AlreadyCancelled`]
    /// when it was already cancelled.
    pub fn cancel(&mut self, clock: &impl Clock) -> Result<(), TransitionError> {
        let state = self.lifecycle_state();
        if self.lifecycle.is_completed() {
            return Err(TransitionError::CannotCancelCompleted {
                task_id: self.id,
                state,
            });
        }
        if self.lifecycle.is_cancelled() {
            return Err(TransitionError::AlreadyCancelled {
                task_id: self.id,
                state,
            });
        }
        let timestamp = clock.utc();
        self.lifecycle.cancelled_at = Some(timestamp);
        self.updated_at = timestamp;
        Ok(())
    }

    /// Checks that the task itself may be archived.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::AlreadyArchived`] or
    /// [`TransitionError::CannotArchiveActive`].
    pub fn ensure_archivable(&self) -> Result<(), TransitionError> {
        let state = self.lifecycle_state();
        match state {
            LifecycleState::Archived => Err(TransitionError::AlreadyArchived {
                task_id: self.id,
                state,
            }),
            LifecycleState::Pending | LifecycleState::InProgress => {
                Err(TransitionError::CannotArchiveActive {
                    task_id: self.id,
                    state,
                })
            }
            LifecycleState::Completed | LifecycleState::Cancelled => Ok(()),
        }
    }

    /// Archives the task at the given timestamp. Completion and cancellation
    /// flags are left unchanged.
    ///
    /// Cascades pass one shared timestamp so a subtree is archived as a
    /// single batch.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Self::ensure_archivable`].
    pub fn archive_at(&mut self, timestamp: DateTime<Utc>) -> Result<(), TransitionError> {
        self.ensure_archivable()?;
        self.lifecycle.archived_at = Some(timestamp);
        self.updated_at = timestamp;
        Ok(())
    }

    /// Returns a completed task to active work. The previous result is kept
    /// until the next completion overwrites it.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::ArchivedImmutable`] for archived tasks and
    /// [`TransitionError::CannotReopen`] for any state other than completed.
    pub fn reopen(&mut self, clock: &impl Clock) -> Result<(), TransitionError> {
        self.ensure_mutable()?;
        let state = self.lifecycle_state();
        if state != LifecycleState::Completed {
            return Err(TransitionError::CannotReopen {
                task_id: self.id,
                state,
            });
        }
        self.lifecycle.completed_at = None;
        self.commit_sha = None;
        self.touch(clock);
        Ok(())
    }

    /// Forgets the recorded bookmark after it has been deleted.
    pub fn clear_bookmark(&mut self) {
        self.bookmark = None;
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

fn normalize_description(description: String) -> Result<String, TaskDomainError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyDescription);
    }
    if trimmed.len() == description.len() {
        return Ok(description);
    }
    Ok(trimmed.to_owned())
}
