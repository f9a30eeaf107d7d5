//! Lifecycle state derivation and the predicates every transition check uses.
//!
//! A task stores only timestamps. Its lifecycle state is derived from which
//! timestamps are present, with the precedence
//! `archived > cancelled > completed > started > pending`. Keeping the flags
//! derived means a flag is set exactly when its timestamp is set.

use super::ParseLifecycleStateError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Enumerated lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Created, not yet started.
    Pending,
    /// Started and not yet finished.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Abandoned before completion.
    Cancelled,
    /// Finished and frozen.
    Archived,
}

impl LifecycleState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Archived => "archived",
        }
    }

    /// Returns `true` for states in which work may still happen.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

impl TryFrom<&str> for LifecycleState {
    type Error = ParseLifecycleStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "archived" => Ok(Self::Archived),
            _ => Err(ParseLifecycleStateError(value.to_owned())),
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle timestamps of a task. Presence of a timestamp is the flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleTimestamps {
    /// When work started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the task was completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the task was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// When the task was archived.
    pub archived_at: Option<DateTime<Utc>>,
}

impl LifecycleTimestamps {
    /// Derives the single lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        if self.archived_at.is_some() {
            LifecycleState::Archived
        } else if self.cancelled_at.is_some() {
            LifecycleState::Cancelled
        } else if self.completed_at.is_some() {
            LifecycleState::Completed
        } else if self.started_at.is_some() {
            LifecycleState::InProgress
        } else {
            LifecycleState::Pending
        }
    }

    /// Returns `true` once work has started.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Returns `true` once the task has been completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Returns `true` once the task has been cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled_at.is_some()
    }

    /// Returns `true` once the task has been archived.
    #[must_use]
    pub const fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// A task no longer holds its parent open once it is completed or
    /// cancelled.
    #[must_use]
    pub const fn is_finished_for_hierarchy(&self) -> bool {
        self.is_completed() || self.is_cancelled()
    }

    /// Only a completed, non-cancelled, non-archived task releases the tasks
    /// it blocks. Cancelled blockers keep their dependents blocked.
    #[must_use]
    pub const fn satisfies_blocker(&self) -> bool {
        self.is_completed() && !self.is_cancelled() && !self.is_archived()
    }

    /// Returns `true` while work on the task may still happen.
    #[must_use]
    pub const fn is_active_for_work(&self) -> bool {
        self.state().is_active()
    }
}
