//! Task creation, retrieval, editing, dependency management and deletion.

use super::{
    TaskServiceResult,
    view::{detailed_view, require_task, summary_view},
};
use crate::task::{
    domain::{NewTaskData, Priority, Task, TaskId, TaskView},
    ports::{TaskFilter, TaskRepository},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    description: String,
    context: String,
    parent_id: Option<TaskId>,
    priority: Option<i64>,
    blocked_by: Vec<TaskId>,
}

impl CreateTaskRequest {
    /// Creates a request for a root task with default priority.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            context: String::new(),
            parent_id: None,
            priority: None,
            blocked_by: Vec::new(),
        }
    }

    /// Sets the task's own context.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Places the task under a parent.
    #[must_use]
    pub const fn with_parent(mut self, parent_id: TaskId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Sets the priority. Validated on creation.
    #[must_use]
    pub const fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the initial blockers.
    #[must_use]
    pub fn with_blockers(mut self, blockers: impl IntoIterator<Item = TaskId>) -> Self {
        self.blocked_by = blockers.into_iter().collect();
        self
    }
}

/// Request payload for editing a task. Unset fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    task_id: TaskId,
    description: Option<String>,
    context: Option<String>,
    priority: Option<i64>,
    parent: Option<Option<TaskId>>,
}

impl UpdateTaskRequest {
    /// Creates an empty edit for `task_id`.
    #[must_use]
    pub const fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            description: None,
            context: None,
            priority: None,
            parent: None,
        }
    }

    /// Replaces the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replaces the task's own context.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Replaces the priority. Validated on update.
    #[must_use]
    pub const fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Moves the task under `parent_id`.
    #[must_use]
    pub const fn with_parent(mut self, parent_id: TaskId) -> Self {
        self.parent = Some(Some(parent_id));
        self
    }

    /// Moves the task to the root level.
    #[must_use]
    pub const fn detach_parent(mut self) -> Self {
        self.parent = Some(None);
        self
    }
}

/// Task CRUD and dependency orchestration service.
#[derive(Clone)]
pub struct TaskService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> TaskService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a new task service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates a task.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::Domain`] for invalid input and
    /// [`super::TaskServiceError::Structural`] when the parent or blockers
    /// are missing or would break the graph.
    pub async fn create(&self, request: CreateTaskRequest) -> TaskServiceResult<TaskView> {
        let priority = request
            .priority
            .map(Priority::new)
            .transpose()?
            .unwrap_or_default();
        let task = Task::new(
            NewTaskData {
                parent_id: request.parent_id,
                description: request.description,
                context: request.context,
                priority,
            },
            &*self.clock,
        )?;
        self.repository.insert(&task, &request.blocked_by).await?;
        info!(task_id = %task.id(), parent_id = ?task.parent_id(), "task created");
        summary_view(self.repository.as_ref(), &task).await
    }

    /// Retrieves a task with its inherited context and learnings.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::TaskNotFound`] for unknown ids.
    pub async fn get(&self, id: TaskId) -> TaskServiceResult<TaskView> {
        detailed_view(&self.repository, id).await
    }

    /// Lists tasks matching `filter`, most urgent first.
    ///
    /// Listings never carry inherited context or learnings.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn list(&self, filter: &TaskFilter) -> TaskServiceResult<Vec<TaskView>> {
        let tasks = self.repository.list(filter).await?;
        let snapshot = self.repository.snapshot().await?;
        Ok(tasks
            .iter()
            .filter(|task| {
                filter
                    .depth
                    .is_none_or(|depth| snapshot.compute_depth(task.id()) == depth)
            })
            .filter(|task| !filter.ready || snapshot.is_ready(task.id()))
            .map(|task| TaskView::new(task, &snapshot))
            .collect())
    }

    /// Edits a task. A parent change is validated like a structural
    /// mutation.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::Transition`] for archived tasks,
    /// [`super::TaskServiceError::Domain`] for invalid values and
    /// [`super::TaskServiceError::Structural`] for invalid moves.
    pub async fn update(&self, request: UpdateTaskRequest) -> TaskServiceResult<TaskView> {
        let id = request.task_id;
        let mut preview = require_task(self.repository.as_ref(), id).await?;
        preview.ensure_mutable()?;
        let priority = request.priority.map(Priority::new).transpose()?;
        let UpdateTaskRequest {
            description,
            context,
            parent,
            ..
        } = request;

        let clock = Arc::clone(&self.clock);
        let edits = move |task: &mut Task| -> TaskServiceResult<()> {
            task.ensure_mutable()?;
            if let Some(text) = &description {
                task.set_description(text.clone(), &*clock)?;
            }
            if let Some(text) = &context {
                task.set_context(text.clone(), &*clock);
            }
            if let Some(value) = priority {
                task.set_priority(value, &*clock);
            }
            Ok(())
        };
        // Invalid edits must fail before the move is written.
        edits(&mut preview)?;

        if let Some(parent_id) = parent.filter(|parent_id| *parent_id != preview.parent_id()) {
            self.repository
                .reparent(id, parent_id, self.clock.utc())
                .await?;
            info!(task_id = %id, parent_id = ?parent_id, "task moved");
        }
        let task = self.repository.modify(id, edits).await?;
        summary_view(self.repository.as_ref(), &task).await
    }

    /// Deletes a task and everything below it. Returns the removed ids.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::TaskNotFound`] for unknown ids.
    pub async fn delete(&self, id: TaskId) -> TaskServiceResult<Vec<TaskId>> {
        let removed = self.repository.delete_cascade(id).await?;
        info!(task_id = %id, removed = removed.len(), "task subtree deleted");
        Ok(removed)
    }

    /// Makes `task_id` wait for `blocker_id`.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::Structural`] when the edge would
    /// create a cycle or link a task to its own ancestor or descendant.
    pub async fn add_blocker(
        &self,
        task_id: TaskId,
        blocker_id: TaskId,
    ) -> TaskServiceResult<TaskView> {
        let task = require_task(self.repository.as_ref(), task_id).await?;
        task.ensure_mutable()?;
        self.repository.add_blocker(task_id, blocker_id).await?;
        debug!(task_id = %task_id, blocker_id = %blocker_id, "blocker added");
        summary_view(self.repository.as_ref(), &task).await
    }

    /// Removes a blocker edge. Removing a missing edge is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::Transition`] for archived tasks.
    pub async fn remove_blocker(
        &self,
        task_id: TaskId,
        blocker_id: TaskId,
    ) -> TaskServiceResult<TaskView> {
        let task = require_task(self.repository.as_ref(), task_id).await?;
        task.ensure_mutable()?;
        let removed = self.repository.remove_blocker(task_id, blocker_id).await?;
        debug!(task_id = %task_id, blocker_id = %blocker_id, removed, "blocker removed");
        summary_view(self.repository.as_ref(), &task).await
    }

    /// Finds the next task ready for work below `root`, or across all
    /// roots.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::TaskNotFound`] when `root` is
    /// unknown.
    pub async fn next_ready(&self, root: Option<TaskId>) -> TaskServiceResult<Option<TaskView>> {
        if let Some(root_id) = root {
            require_task(self.repository.as_ref(), root_id).await?;
        }
        let snapshot = self.repository.snapshot().await?;
        match snapshot.next_ready(root) {
            Some(ready) => Ok(Some(detailed_view(&self.repository, ready).await?)),
            None => Ok(None),
        }
    }
}
