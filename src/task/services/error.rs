//! Service-level error taxonomy.

use crate::task::{
    domain::{GraphViolation, LearningId, TaskDomainError, TaskId, TransitionError},
    ports::{TaskRepositoryError, VcsError},
};
use thiserror::Error;

/// Errors returned by task services.
///
/// Callers can branch on [`Self::code`] to decide whether a retry with
/// different arguments makes sense.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The learning does not exist.
    #[error("learning not found: {0}")]
    LearningNotFound(LearningId),

    /// Input validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The change would break the hierarchy or blocker graph.
    #[error(transparent)]
    Structural(#[from] GraphViolation),

    /// The lifecycle transition is not allowed from the current state.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// A required version-control step failed.
    #[error(transparent)]
    Vcs(#[from] VcsError),

    /// Nothing below the requested task can be started.
    #[error("no startable task found under {requested}")]
    NoStartableTask {
        /// Task that was asked to start.
        requested: TaskId,
    },

    /// A commit message template could not be rendered.
    #[error("failed to render commit message template: {reason}")]
    TemplateRender {
        /// Renderer error message.
        reason: String,
    },

    /// Repository operation failed.
    #[error(transparent)]
    Repository(TaskRepositoryError),
}

impl From<TaskRepositoryError> for TaskServiceError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound(id) => Self::TaskNotFound(id),
            TaskRepositoryError::LearningNotFound(id) => Self::LearningNotFound(id),
            TaskRepositoryError::Structural(violation) => Self::Structural(violation),
            other @ (TaskRepositoryError::DuplicateTask(_)
            | TaskRepositoryError::Persistence(_)) => Self::Repository(other),
        }
    }
}

impl TaskServiceError {
    /// Returns a stable machine-readable code for the error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::TaskNotFound(_) => "task_not_found",
            Self::LearningNotFound(_) => "learning_not_found",
            Self::Domain(err) => err.code(),
            Self::Structural(err) => err.code(),
            Self::Transition(err) => err.code(),
            Self::Vcs(err) => err.code(),
            Self::NoStartableTask { .. } => "no_startable_task",
            Self::TemplateRender { .. } => "template_render",
            Self::Repository(TaskRepositoryError::DuplicateTask(_)) => "duplicate_task",
            Self::Repository(_) => "persistence",
        }
    }
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;
