//! Learning notes attached to tasks and their bubbling up the hierarchy.

use super::{TaskServiceResult, view::require_task};
use crate::task::{
    domain::{Learning, LearningId, Task, TaskId},
    ports::{TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::debug;

/// Records, lists and removes learnings.
#[derive(Clone)]
pub struct LearningService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> LearningService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new learning service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Attaches a learning to a task.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::TaskNotFound`] for unknown tasks,
    /// [`super::TaskServiceError::Transition`] for archived tasks and
    /// [`super::TaskServiceError::Domain`] for blank content.
    pub async fn add(&self, task_id: TaskId, content: &str) -> TaskServiceResult<Learning> {
        let task = require_task(self.repository.as_ref(), task_id).await?;
        task.ensure_mutable()?;
        let learning = Learning::new(task_id, content, &*self.clock)?;
        self.repository.attach_learning(&learning).await?;
        debug!(task_id = %task_id, learning_id = %learning.id(), "learning added");
        Ok(learning)
    }

    /// Retrieves a learning.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::LearningNotFound`] for unknown
    /// identifiers.
    pub async fn get(&self, id: LearningId) -> TaskServiceResult<Learning> {
        Ok(self
            .repository
            .find_learning(id)
            .await?
            .ok_or(TaskRepositoryError::LearningNotFound(id))?)
    }

    /// Lists the learnings held by a task, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::TaskNotFound`] for unknown tasks.
    pub async fn list(&self, task_id: TaskId) -> TaskServiceResult<Vec<Learning>> {
        require_task(self.repository.as_ref(), task_id).await?;
        Ok(self.repository.list_learnings(task_id).await?)
    }

    /// Deletes a learning.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::LearningNotFound`] for unknown
    /// identifiers.
    pub async fn delete(&self, id: LearningId) -> TaskServiceResult<()> {
        self.repository.delete_learning(id).await?;
        debug!(learning_id = %id, "learning deleted");
        Ok(())
    }

    /// Copies every learning held by `task` to its immediate parent.
    ///
    /// Notes the parent already holds from the same author are skipped, so
    /// completing a task twice does not duplicate them. Returns the number
    /// of copies made. Roots have nowhere to bubble to.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn bubble_to_parent(&self, task: &Task) -> TaskServiceResult<usize> {
        let Some(parent_id) = task.parent_id() else {
            return Ok(0);
        };
        let own = self.repository.list_learnings(task.id()).await?;
        let mut held = self.repository.list_learnings(parent_id).await?;

        let mut copied = 0;
        for learning in own {
            if held.iter().any(|existing| existing.is_same_note(&learning)) {
                continue;
            }
            let copy = learning.copied_to(parent_id, &*self.clock);
            self.repository.attach_learning(&copy).await?;
            held.push(copy);
            copied += 1;
        }
        debug!(task_id = %task.id(), parent_id = %parent_id, copied, "learnings bubbled");
        Ok(copied)
    }
}
