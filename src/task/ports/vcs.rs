//! Version-control port consumed by the workflow coordinator.

use crate::task::domain::{BookmarkName, PositionRef};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for version-control operations.
pub type VcsResult<T> = Result<T, VcsError>;

/// Kind of repository found in the working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoKind {
    /// A Git repository.
    Git,
}

impl RepoKind {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Git => "git",
        }
    }
}

impl fmt::Display for RepoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of committing pending changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new revision was recorded.
    Committed(PositionRef),
    /// There was nothing to commit.
    NothingToCommit,
}

/// Working-copy operations needed to drive task lifecycles.
#[async_trait]
pub trait VcsBackend: Send + Sync {
    /// Detects the repository containing the working directory.
    ///
    /// Returns `None` outside any repository.
    async fn detect(&self) -> VcsResult<Option<RepoKind>>;

    /// Returns `true` when the working copy has no uncommitted changes.
    async fn is_clean(&self) -> VcsResult<bool>;

    /// Returns the revision the working copy currently sits on.
    async fn current_position(&self) -> VcsResult<PositionRef>;

    /// Creates a bookmark pointing at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::BookmarkExists`] when the name is taken.
    async fn create_bookmark(&self, name: &BookmarkName, at: &PositionRef) -> VcsResult<()>;

    /// Deletes a bookmark.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::BookmarkNotFound`] when no such bookmark exists.
    async fn delete_bookmark(&self, name: &BookmarkName) -> VcsResult<()>;

    /// Records every pending change as a new revision.
    async fn commit_all(&self, message: &str) -> VcsResult<CommitOutcome>;
}

/// Errors returned by version-control adapters.
#[derive(Debug, Clone, Error)]
pub enum VcsError {
    /// No repository was found.
    #[error("not inside a version-controlled working copy")]
    NotARepository,

    /// The working copy has changes that prevent the operation.
    #[error("working copy has uncommitted or conflicting changes")]
    DirtyWorkingCopy,

    /// The bookmark already exists.
    #[error("bookmark already exists: {0}")]
    BookmarkExists(BookmarkName),

    /// The bookmark does not exist.
    #[error("bookmark not found: {0}")]
    BookmarkNotFound(BookmarkName),

    /// A version-control command exited unsuccessfully.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed {
        /// Command line that was run.
        command: String,
        /// Captured standard error.
        stderr: String,
    },

    /// Generic backend failure.
    #[error("version control error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl VcsError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }

    /// Returns a stable machine-readable code for the error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotARepository => "not_a_repository",
            Self::DirtyWorkingCopy => "dirty_working_copy",
            Self::BookmarkExists(_) => "bookmark_exists",
            Self::BookmarkNotFound(_) => "bookmark_not_found",
            Self::CommandFailed { .. } => "vcs_command_failed",
            Self::Backend(_) => "vcs_backend",
        }
    }
}
