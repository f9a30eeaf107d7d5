//! Identifier and validated scalar types for the task domain.

use super::{ParseIdError, TaskDomainError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Prefix rendered in front of every task identifier.
pub const TASK_ID_PREFIX: &str = "task_";

/// Prefix rendered in front of every learning identifier.
pub const LEARNING_ID_PREFIX: &str = "lrn_";

/// Unique, time-sortable identifier for a task.
///
/// Rendered as `task_` followed by the simple form of a version 7 UUID, so
/// lexical order follows creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a task identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TASK_ID_PREFIX}{}", self.0.simple())
    }
}

impl FromStr for TaskId {
    type Err = ParseIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_prefixed(TASK_ID_PREFIX, "task", value).map(Self)
    }
}

impl TryFrom<String> for TaskId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.to_string()
    }
}

/// Unique, time-sortable identifier for a learning record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LearningId(Uuid);

impl LearningId {
    /// Creates a new time-ordered learning identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a learning identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for LearningId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LearningId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{LEARNING_ID_PREFIX}{}", self.0.simple())
    }
}

impl FromStr for LearningId {
    type Err = ParseIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_prefixed(LEARNING_ID_PREFIX, "learning", value).map(Self)
    }
}

impl TryFrom<String> for LearningId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LearningId> for String {
    fn from(id: LearningId) -> Self {
        id.to_string()
    }
}

fn parse_prefixed(prefix: &str, entity: &'static str, value: &str) -> Result<Uuid, ParseIdError> {
    let trimmed = value.trim();
    trimmed
        .strip_prefix(prefix)
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| ParseIdError {
            entity,
            value: value.to_owned(),
        })
}

/// Scheduling priority. Lower values are more urgent.
///
/// Valid values are `0` (urgent), `1` (default) and `2` (low). Ordering is
/// ascending, so sorting a collection puts the most urgent work first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Priority(u8);

impl Priority {
    /// Most urgent priority value.
    pub const HIGHEST: Self = Self(0);
    /// Priority assigned when none is requested.
    pub const DEFAULT: Self = Self(1);
    /// Least urgent priority value.
    pub const LOWEST: Self = Self(2);

    /// Creates a validated priority.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidPriority`] when the value lies
    /// outside `0..=2`.
    pub fn new(value: i64) -> Result<Self, TaskDomainError> {
        u8::try_from(value)
            .ok()
            .filter(|candidate| *candidate <= Self::LOWEST.0)
            .map(Self)
            .ok_or(TaskDomainError::InvalidPriority(value))
    }

    /// Returns the numeric priority.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for Priority {
    type Error = TaskDomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Priority> for i64 {
    fn from(priority: Priority) -> Self {
        Self::from(priority.0)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}
