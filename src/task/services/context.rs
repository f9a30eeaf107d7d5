//! Assembles inherited context and learnings for single-task retrieval.

use super::TaskServiceResult;
use crate::task::{
    domain::{ContextChain, GraphSnapshot, InheritedLearnings, Task},
    ports::{TaskRepository, TaskRepositoryError},
};
use std::sync::Arc;

/// Fetches a task's ancestors and builds what it inherits from them.
///
/// Only used for single-item retrieval. Listings never pay for it.
#[derive(Clone)]
pub struct ContextAssembler<R>
where
    R: TaskRepository,
{
    repository: Arc<R>,
}

impl<R> ContextAssembler<R>
where
    R: TaskRepository,
{
    /// Creates a new assembler.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Builds the context chain for `task`.
    ///
    /// # Errors
    ///
    /// Returns repository errors, including not-found for a dangling parent.
    pub async fn build_context_chain(
        &self,
        task: &Task,
        snapshot: &GraphSnapshot,
    ) -> TaskServiceResult<ContextChain> {
        let ancestors = self.load_ancestors(task, snapshot).await?;
        Ok(ContextChain::build(task, &ancestors))
    }

    /// Builds the inherited learnings bundle for `task`.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn build_inherited_learnings(
        &self,
        task: &Task,
        snapshot: &GraphSnapshot,
    ) -> TaskServiceResult<InheritedLearnings> {
        let own = self.repository.list_learnings(task.id()).await?;
        let mut by_ancestor = Vec::new();
        for ancestor in snapshot.ancestors(task.id()) {
            by_ancestor.push(self.repository.list_learnings(ancestor).await?);
        }
        Ok(InheritedLearnings::build(own, by_ancestor))
    }

    async fn load_ancestors(
        &self,
        task: &Task,
        snapshot: &GraphSnapshot,
    ) -> TaskServiceResult<Vec<Task>> {
        let mut ancestors = Vec::new();
        for ancestor_id in snapshot.ancestors(task.id()) {
            let ancestor = self
                .repository
                .find_by_id(ancestor_id)
                .await?
                .ok_or(TaskRepositoryError::NotFound(ancestor_id))?;
            ancestors.push(ancestor);
        }
        Ok(ancestors)
    }
}
