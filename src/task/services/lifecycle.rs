//! Terminal lifecycle transitions: cancel, archive and reopen.

use super::{TaskServiceResult, view::summary_view};
use crate::task::{
    domain::{Task, TaskId, TaskView, TransitionError},
    ports::TaskRepository,
};
use mockable::Clock;
use std::sync::Arc;
use tracing::info;

/// Applies lifecycle transitions that do not touch version control.
///
/// Starting and completing work go through
/// [`super::WorkflowCoordinator`], which owns the bookmark and commit side
/// effects.
#[derive(Clone)]
pub struct LifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> LifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a new lifecycle service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Cancels a pending or in-progress task. Children keep their state.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::Transition`] when the task is
    /// completed or already cancelled.
    pub async fn cancel(&self, id: TaskId) -> TaskServiceResult<TaskView> {
        let clock = Arc::clone(&self.clock);
        let task = self
            .repository
            .modify(id, move |task: &mut Task| -> TaskServiceResult<()> {
                Ok(task.cancel(&*clock)?)
            })
            .await?;
        info!(task_id = %id, "task cancelled");
        summary_view(self.repository.as_ref(), &task).await
    }

    /// Archives a finished task.
    ///
    /// Archiving a root requires every descendant to be finished and then
    /// archives the whole subtree with one shared timestamp. Descendants
    /// that were already archived keep their original timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::CannotArchiveActive`],
    /// [`TransitionError::AlreadyArchived`] or
    /// [`TransitionError::PendingChildren`] wrapped in
    /// [`super::TaskServiceError::Transition`].
    pub async fn archive(&self, id: TaskId) -> TaskServiceResult<TaskView> {
        let clock = Arc::clone(&self.clock);
        let task = self
            .repository
            .modify_subtree(id, move |task, descendants| {
                archive_subtree(task, descendants, &*clock)
            })
            .await?;
        info!(task_id = %id, archived_at = ?task.lifecycle().archived_at, "task archived");
        summary_view(self.repository.as_ref(), &task).await
    }

    /// Returns a completed task to active work.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::CannotReopen`] unless the task is
    /// completed, and [`TransitionError::ArchivedImmutable`] for archived
    /// tasks.
    pub async fn reopen(&self, id: TaskId) -> TaskServiceResult<TaskView> {
        let clock = Arc::clone(&self.clock);
        let task = self
            .repository
            .modify(id, move |task: &mut Task| -> TaskServiceResult<()> {
                Ok(task.reopen(&*clock)?)
            })
            .await?;
        info!(task_id = %id, "task reopened");
        summary_view(self.repository.as_ref(), &task).await
    }
}

/// Archives `task`, cascading to its unarchived descendants when it is a
/// root. Every task archived here shares one timestamp.
fn archive_subtree(
    task: &mut Task,
    descendants: &mut [Task],
    clock: &impl Clock,
) -> TaskServiceResult<()> {
    task.ensure_archivable()?;
    let timestamp = clock.utc();
    if task.parent_id().is_some() {
        task.archive_at(timestamp)?;
        return Ok(());
    }

    let pending: Vec<TaskId> = descendants
        .iter()
        .filter(|descendant| !descendant.lifecycle().is_finished_for_hierarchy())
        .map(Task::id)
        .collect();
    if !pending.is_empty() {
        return Err(TransitionError::PendingChildren {
            task_id: task.id(),
            state: task.lifecycle_state(),
            pending,
        }
        .into());
    }
    for descendant in descendants
        .iter_mut()
        .filter(|descendant| !descendant.lifecycle().is_archived())
    {
        descendant.archive_at(timestamp)?;
    }
    task.archive_at(timestamp)?;
    Ok(())
}
