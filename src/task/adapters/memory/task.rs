//! In-memory repository for task hierarchy tests and embedded use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    adapters::ordering::{sort_for_listing, sort_learnings},
    domain::{
        BookmarkName, GraphSnapshot, Learning, LearningId, PositionRef, StructuralChange, Task,
        TaskId,
    },
    ports::{TaskFilter, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// Structural writes validate and apply under one write lock, so a
/// concurrent writer cannot slip in between the check and the change.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    /// `(task, blocker)` pairs.
    edges: BTreeSet<(TaskId, TaskId)>,
    learnings: HashMap<LearningId, Learning>,
}

impl InMemoryTaskState {
    fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::from_parts(self.tasks.values(), self.edges.iter().copied())
    }

    fn require(&self, id: TaskId) -> TaskRepositoryResult<&Task> {
        self.tasks.get(&id).ok_or(TaskRepositoryError::NotFound(id))
    }

    /// Parent changes only go through `reparent`.
    fn store_keeping_parent(&mut self, task: &Task) -> TaskRepositoryResult<()> {
        let stored_parent = self.require(task.id())?.parent_id();
        let mut data = task.to_persisted();
        data.parent_id = stored_parent;
        self.tasks.insert(task.id(), Task::from_persisted(data));
        Ok(())
    }

    fn collect(&self, ids: impl IntoIterator<Item = TaskId>) -> Vec<Task> {
        ids.into_iter()
            .filter_map(|id| self.tasks.get(&id).cloned())
            .collect()
    }
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| filter.matches_stored(task))
            .cloned()
            .collect();
        sort_for_listing(&mut tasks);
        Ok(tasks)
    }

    async fn find_children(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let children = state.snapshot().children_of(id);
        Ok(state.collect(children))
    }

    async fn find_descendants(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let descendants = state.snapshot().descendants(id);
        Ok(state.collect(descendants))
    }

    async fn find_blockers(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskId>> {
        let state = self.read()?;
        Ok(state
            .edges
            .iter()
            .filter(|(task, _)| *task == id)
            .map(|(_, blocker)| *blocker)
            .collect())
    }

    async fn find_blocking(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskId>> {
        let state = self.read()?;
        let mut blocked: Vec<TaskId> = state
            .edges
            .iter()
            .filter(|(_, blocker)| *blocker == id)
            .map(|(task, _)| *task)
            .collect();
        blocked.sort_unstable();
        Ok(blocked)
    }

    async fn snapshot(&self) -> TaskRepositoryResult<GraphSnapshot> {
        let state = self.read()?;
        Ok(state.snapshot())
    }

    async fn insert(&self, task: &Task, blocked_by: &[TaskId]) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.snapshot().validate(&StructuralChange::Insert {
            task_id: task.id(),
            parent_id: task.parent_id(),
            blocked_by: blocked_by.to_vec(),
        })?;

        state.tasks.insert(task.id(), task.clone());
        for blocker in blocked_by {
            state.edges.insert((task.id(), *blocker));
        }
        Ok(())
    }

    async fn modify<F, E>(&self, id: TaskId, apply: F) -> Result<Task, E>
    where
        F: FnOnce(&mut Task) -> Result<(), E> + Send + 'static,
        E: From<TaskRepositoryError> + Send + 'static,
    {
        let mut state = self.write()?;
        let mut task = state.require(id)?.clone();
        apply(&mut task)?;
        state.store_keeping_parent(&task)?;
        Ok(task)
    }

    async fn modify_subtree<F, E>(&self, id: TaskId, apply: F) -> Result<Task, E>
    where
        F: FnOnce(&mut Task, &mut [Task]) -> Result<(), E> + Send + 'static,
        E: From<TaskRepositoryError> + Send + 'static,
    {
        let mut state = self.write()?;
        let mut task = state.require(id)?.clone();
        let descendant_ids = state.snapshot().descendants(id);
        let mut descendants = state.collect(descendant_ids);
        apply(&mut task, &mut descendants)?;
        for descendant in &descendants {
            state.store_keeping_parent(descendant)?;
        }
        state.store_keeping_parent(&task)?;
        Ok(task)
    }

    async fn reparent(
        &self,
        task_id: TaskId,
        parent_id: Option<TaskId>,
        moved_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state.require(task_id)?;
        state.snapshot().validate(&StructuralChange::Reparent { task_id, parent_id })?;
        if let Some(task) = state.tasks.get_mut(&task_id) {
            task.set_parent(parent_id, moved_at);
        }
        Ok(())
    }

    async fn add_blocker(&self, task_id: TaskId, blocker_id: TaskId) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.edges.contains(&(task_id, blocker_id)) {
            return Ok(());
        }
        state.snapshot().validate(&StructuralChange::AddBlocker {
            task_id,
            blocker_id,
        })?;
        state.edges.insert((task_id, blocker_id));
        Ok(())
    }

    async fn remove_blocker(
        &self,
        task_id: TaskId,
        blocker_id: TaskId,
    ) -> TaskRepositoryResult<bool> {
        let mut state = self.write()?;
        state.require(task_id)?;
        Ok(state.edges.remove(&(task_id, blocker_id)))
    }

    async fn delete_cascade(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskId>> {
        let mut state = self.write()?;
        state.require(id)?;
        let mut removed = vec![id];
        removed.extend(state.snapshot().descendants(id));

        for task_id in &removed {
            state.tasks.remove(task_id);
        }
        state
            .edges
            .retain(|(task, blocker)| !removed.contains(task) && !removed.contains(blocker));
        state
            .learnings
            .retain(|_, learning| !removed.contains(&learning.task_id()));
        Ok(removed)
    }

    async fn set_bookmark(
        &self,
        id: TaskId,
        bookmark: &BookmarkName,
        start_commit: Option<&PositionRef>,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let task = state
            .tasks
            .get_mut(&id)
            .ok_or(TaskRepositoryError::NotFound(id))?;
        task.record_start_position(Some(bookmark.clone()), start_commit.cloned());
        Ok(())
    }

    async fn clear_bookmark(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let task = state
            .tasks
            .get_mut(&id)
            .ok_or(TaskRepositoryError::NotFound(id))?;
        task.clear_bookmark();
        Ok(())
    }

    async fn attach_learning(&self, learning: &Learning) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state.require(learning.task_id())?;
        state.learnings.insert(learning.id(), learning.clone());
        Ok(())
    }

    async fn list_learnings(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Learning>> {
        let state = self.read()?;
        let mut learnings: Vec<Learning> = state
            .learnings
            .values()
            .filter(|learning| learning.task_id() == task_id)
            .cloned()
            .collect();
        sort_learnings(&mut learnings);
        Ok(learnings)
    }

    async fn find_learning(&self, id: LearningId) -> TaskRepositoryResult<Option<Learning>> {
        let state = self.read()?;
        Ok(state.learnings.get(&id).cloned())
    }

    async fn delete_learning(&self, id: LearningId) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state
            .learnings
            .remove(&id)
            .map(|_| ())
            .ok_or(TaskRepositoryError::LearningNotFound(id))
    }
}
