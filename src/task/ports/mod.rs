//! Port contracts for task persistence and version control.

mod repository;
mod vcs;

pub use repository::{TaskFilter, TaskRepository, TaskRepositoryError, TaskRepositoryResult};
pub use vcs::{CommitOutcome, RepoKind, VcsBackend, VcsError, VcsResult};
