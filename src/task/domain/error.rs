//! Error types for task domain validation, parsing and lifecycle transitions.

use super::{LifecycleState, TaskId};
use thiserror::Error;

/// Errors returned while constructing domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The priority lies outside the supported range.
    #[error("invalid priority {0}, expected a value between 0 and 2")]
    InvalidPriority(i64),

    /// The task description is empty after trimming.
    #[error("task description must not be empty")]
    EmptyDescription,

    /// The learning content is empty after trimming.
    #[error("learning content must not be empty")]
    EmptyLearning,

    /// The bookmark name breaks the naming rules.
    #[error("invalid bookmark name '{0}'")]
    InvalidBookmarkName(String),

    /// The revision reference is empty or malformed.
    #[error("invalid revision reference '{0}'")]
    InvalidPosition(String),
}

impl TaskDomainError {
    /// Returns a stable machine-readable code for the error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidPriority(_) => "invalid_priority",
            Self::EmptyDescription => "empty_description",
            Self::EmptyLearning => "empty_learning",
            Self::InvalidBookmarkName(_) => "invalid_bookmark_name",
            Self::InvalidPosition(_) => "invalid_position",
        }
    }
}

/// Error returned while parsing a prefixed identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {entity} identifier: {value}")]
pub struct ParseIdError {
    /// Entity kind the identifier was meant for.
    pub entity: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Error returned while parsing lifecycle states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown lifecycle state: {0}")]
pub struct ParseLifecycleStateError(pub String);

/// Rejected lifecycle transition. Every variant names the task and its
/// current lifecycle state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// Completed tasks cannot be cancelled.
    #[error("task {task_id} is {state} and cannot be cancelled once completed")]
    CannotCancelCompleted {
        /// Task identifier.
        task_id: TaskId,
        /// Current lifecycle state.
        state: LifecycleState,
    },

    /// The task has already been cancelled.
    #[error("task {task_id} is {state} and was already cancelled")]
    AlreadyCancelled {
        /// Task identifier.
        task_id: TaskId,
        /// Current lifecycle state.
        state: LifecycleState,
    },

    /// Only completed or cancelled tasks can be archived.
    #[error("task {task_id} is {state}; only finished tasks can be archived")]
    CannotArchiveActive {
        /// Task identifier.
        task_id: TaskId,
        /// Current lifecycle state.
        state: LifecycleState,
    },

    /// The task has already been archived.
    #[error("task {task_id} is already archived")]
    AlreadyArchived {
        /// Task identifier.
        task_id: TaskId,
        /// Current lifecycle state.
        state: LifecycleState,
    },

    /// A root cannot be archived while descendants are still active.
    #[error("task {task_id} has {} unfinished descendant(s)", .pending.len())]
    PendingChildren {
        /// Task identifier.
        task_id: TaskId,
        /// Current lifecycle state.
        state: LifecycleState,
        /// Descendants that are neither completed nor cancelled.
        pending: Vec<TaskId>,
    },

    /// Cancelled tasks cannot be completed.
    #[error("task {task_id} is {state} and cannot be completed")]
    CannotCompleteCancelled {
        /// Task identifier.
        task_id: TaskId,
        /// Current lifecycle state.
        state: LifecycleState,
    },

    /// Only completed tasks can be reopened.
    #[error("task {task_id} is {state}; only completed tasks can be reopened")]
    CannotReopen {
        /// Task identifier.
        task_id: TaskId,
        /// Current lifecycle state.
        state: LifecycleState,
    },

    /// Archived tasks are read-only.
    #[error("task {task_id} is archived and cannot be modified")]
    ArchivedImmutable {
        /// Task identifier.
        task_id: TaskId,
        /// Current lifecycle state.
        state: LifecycleState,
    },

    /// Finished tasks cannot be started again.
    #[error("task {task_id} is {state} and cannot be started")]
    CannotStartFinished {
        /// Task identifier.
        task_id: TaskId,
        /// Current lifecycle state.
        state: LifecycleState,
    },
}

impl TransitionError {
    /// Returns the task the rejected transition targeted.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        match self {
            Self::CannotCancelCompleted { task_id, .. }
            | Self::AlreadyCancelled { task_id, .. }
            | Self::CannotArchiveActive { task_id, .. }
            | Self::AlreadyArchived { task_id, .. }
            | Self::PendingChildren { task_id, .. }
            | Self::CannotCompleteCancelled { task_id, .. }
            | Self::CannotReopen { task_id, .. }
            | Self::ArchivedImmutable { task_id, .. }
            | Self::CannotStartFinished { task_id, .. } => *task_id,
        }
    }

    /// Returns the lifecycle state the task was in when the transition was
    /// rejected.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        match self {
            Self::CannotCancelCompleted { state, .. }
            | Self::AlreadyCancelled { state, .. }
            | Self::CannotArchiveActive { state, .. }
            | Self::AlreadyArchived { state, .. }
            | Self::PendingChildren { state, .. }
            | Self::CannotCompleteCancelled { state, .. }
            | Self::CannotReopen { state, .. }
            | Self::ArchivedImmutable { state, .. }
            | Self::CannotStartFinished { state, .. } => *state,
        }
    }

    /// Returns a stable machine-readable code for the error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CannotCancelCompleted { .. } => "cannot_cancel_completed",
            Self::AlreadyCancelled { .. } => "already_cancelled",
            Self::CannotArchiveActive { .. } => "cannot_archive_active",
            Self::AlreadyArchived { .. } => "already_archived",
            Self::PendingChildren { .. } => "pending_children",
            Self::CannotCompleteCancelled { .. } => "cannot_complete_cancelled",
            Self::CannotReopen { .. } => "cannot_reopen",
            Self::ArchivedImmutable { .. } => "archived_immutable",
            Self::CannotStartFinished { .. } => "cannot_start_finished",
        }
    }
}
