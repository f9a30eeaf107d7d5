//! Learnings: short notes recorded while finishing work and handed upward.

use super::{LearningId, TaskDomainError, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A note attached to a task.
///
/// `task_id` is the current holder. `source_task_id` is the task that
/// originally produced the note and never changes when the note is copied to
/// a parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Learning {
    id: LearningId,
    task_id: TaskId,
    content: String,
    source_task_id: TaskId,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted learning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedLearningData {
    /// Persisted learning identifier.
    pub id: LearningId,
    /// Persisted holder task.
    pub task_id: TaskId,
    /// Persisted content.
    pub content: String,
    /// Persisted originating task.
    pub source_task_id: TaskId,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Learning {
    /// Creates a learning authored by the task that holds it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyLearning`] when the content is blank.
    pub fn new(
        task_id: TaskId,
        content: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let raw = content.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyLearning);
        }
        Ok(Self {
            id: LearningId::new(),
            task_id,
            content: trimmed.to_owned(),
            source_task_id: task_id,
            created_at: clock.utc(),
        })
    }

    /// Reconstructs a learning from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedLearningData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            content: data.content,
            source_task_id: data.source_task_id,
            created_at: data.created_at,
        }
    }

    /// Returns a copy held by `holder`, keeping the original author.
    #[must_use]
    pub fn copied_to(&self, holder: TaskId, clock: &impl Clock) -> Self {
        Self {
            id: LearningId::new(),
            task_id: holder,
            content: self.content.clone(),
            source_task_id: self.source_task_id,
            created_at: clock.utc(),
        }
    }

    /// Returns `true` when both learnings carry the same note from the same
    /// author.
    #[must_use]
    pub fn is_same_note(&self, other: &Self) -> bool {
        self.source_task_id == other.source_task_id && self.content == other.content
    }

    /// Returns the learning identifier.
    #[must_use]
    pub const fn id(&self) -> LearningId {
        self.id
    }

    /// Returns the holder task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the note text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the task that originally produced the note.
    #[must_use]
    pub const fn source_task_id(&self) -> TaskId {
        self.source_task_id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
