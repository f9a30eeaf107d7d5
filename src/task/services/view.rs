//! Shared loaders that turn stored tasks into [`TaskView`]s.

use super::{ContextAssembler, TaskServiceResult};
use crate::task::{
    domain::{Task, TaskId, TaskView},
    ports::{TaskRepository, TaskRepositoryError},
};
use std::sync::Arc;

/// Loads a task or reports it as not found.
pub(super) async fn require_task<R>(repository: &R, id: TaskId) -> TaskServiceResult<Task>
where
    R: TaskRepository + ?Sized,
{
    Ok(repository
        .find_by_id(id)
        .await?
        .ok_or(TaskRepositoryError::NotFound(id))?)
}

/// Builds the list representation of a task from a fresh snapshot.
pub(super) async fn summary_view<R>(repository: &R, task: &Task) -> TaskServiceResult<TaskView>
where
    R: TaskRepository + ?Sized,
{
    let snapshot = repository.snapshot().await?;
    Ok(TaskView::new(task, &snapshot))
}

/// Builds the single-item representation of a task, including inherited
/// context and learnings.
pub(super) async fn detailed_view<R>(repository: &Arc<R>, id: TaskId) -> TaskServiceResult<TaskView>
where
    R: TaskRepository,
{
    let task = require_task(repository.as_ref(), id).await?;
    let snapshot = repository.snapshot().await?;
    let assembler = ContextAssembler::new(Arc::clone(repository));
    let context_chain = assembler.build_context_chain(&task, &snapshot).await?;
    let learnings = assembler.build_inherited_learnings(&task, &snapshot).await?;
    Ok(TaskView::new(&task, &snapshot).with_details(context_chain, learnings))
}
