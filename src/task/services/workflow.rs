//! Start and completion transitions, with their version-control effects.
//!
//! The coordinator orders two systems without a shared transaction: the
//! commit lands first, local state is persisted second, and bookmark cleanup
//! runs last as a best-effort step that never fails the call.

use super::{
    LearningService, TaskServiceError, TaskServiceResult, WorkflowConfig,
    view::{detailed_view, require_task},
};
use crate::task::{
    domain::{Learning, PositionRef, Task, TaskId, TaskView},
    ports::{CommitOutcome, TaskRepository, VcsBackend, VcsError},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Request payload for completing a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteTaskRequest {
    task_id: TaskId,
    result: Option<String>,
    learnings: Vec<String>,
}

impl CompleteTaskRequest {
    /// Creates a completion request without a result or learnings.
    #[must_use]
    pub const fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            result: None,
            learnings: Vec::new(),
        }
    }

    /// Sets the completion result.
    #[must_use]
    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    /// Sets the learnings recorded on completion.
    #[must_use]
    pub fn with_learnings(mut self, learnings: impl IntoIterator<Item = String>) -> Self {
        self.learnings = learnings.into_iter().collect();
        self
    }
}

/// Outcome of a bookmark sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkSweep {
    /// Tasks whose bookmark was deleted, or was already gone, and cleared.
    pub released: Vec<TaskId>,
    /// Tasks whose bookmark could not be deleted and is still recorded.
    pub retained: Vec<TaskId>,
}

/// Drives the lifecycle edges that touch version control.
#[derive(Clone)]
pub struct WorkflowCoordinator<R, V, C>
where
    R: TaskRepository,
    V: VcsBackend,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    vcs: Arc<V>,
    clock: Arc<C>,
    learnings: LearningService<R, C>,
    config: WorkflowConfig,
}

impl<R, V, C> WorkflowCoordinator<R, V, C>
where
    R: TaskRepository,
    V: VcsBackend,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a new coordinator.
    #[must_use]
    pub fn new(repository: Arc<R>, vcs: Arc<V>, clock: Arc<C>, config: WorkflowConfig) -> Self {
        let learnings = LearningService::new(Arc::clone(&repository), Arc::clone(&clock));
        Self {
            repository,
            vcs,
            clock,
            learnings,
            config,
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Starts work on `id`, or on the first concrete unit of work needed to
    /// finish it.
    ///
    /// When `id` has incomplete children, or is blocked, the deepest
    /// unblocked incomplete leaf is started instead. Starting an
    /// already-started target returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::NotARepository`] or [`VcsError::DirtyWorkingCopy`]
    /// before any side effect, [`TaskServiceError::NoStartableTask`] when
    /// nothing reachable can start, and transition errors for finished or
    /// archived tasks.
    pub async fn start(&self, id: TaskId) -> TaskServiceResult<TaskView> {
        let requested = require_task(self.repository.as_ref(), id).await?;
        requested.ensure_startable()?;
        self.require_repository().await?;
        if self.config.require_clean_start && !self.vcs.is_clean().await? {
            return Err(VcsError::DirtyWorkingCopy.into());
        }

        let snapshot = self.repository.snapshot().await?;
        let target = snapshot
            .resolve_start_target(id)
            .ok_or(TaskServiceError::NoStartableTask { requested: id })?;
        if target != id {
            debug!(requested = %id, target = %target, "start redirected");
        }

        let current = require_task(self.repository.as_ref(), target).await?;
        current.ensure_startable()?;
        if current.lifecycle().is_started() {
            debug!(task_id = %target, "task already started");
            return detailed_view(&self.repository, target).await;
        }

        let bookmark = self.config.bookmark_for(target)?;
        let position = self.vcs.current_position().await?;
        match self.vcs.create_bookmark(&bookmark, &position).await {
            Ok(()) => {}
            Err(VcsError::BookmarkExists(_)) => {
                debug!(task_id = %target, bookmark = %bookmark, "reusing existing bookmark");
            }
            Err(err) => return Err(err.into()),
        }
        let clock = Arc::clone(&self.clock);
        let task = self
            .repository
            .modify(target, move |task: &mut Task| -> TaskServiceResult<()> {
                if task.start(&*clock)? {
                    task.record_start_position(Some(bookmark), Some(position));
                }
                Ok(())
            })
            .await?;
        info!(task_id = %target, start_commit = ?task.start_commit(), "task started");
        detailed_view(&self.repository, target).await
    }

    /// Completes a task.
    ///
    /// Commits pending changes, persists completion, records and bubbles
    /// learnings, then deletes bookmarks best-effort. Completing an
    /// already-completed task returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns transition errors for cancelled or archived tasks,
    /// [`VcsError::NotARepository`] outside a repository and any error from
    /// the commit step. A failed commit leaves the task untouched. When the
    /// task is cancelled or archived while the commit runs, the transition
    /// error is returned and the commit stays in place.
    pub async fn complete(&self, request: CompleteTaskRequest) -> TaskServiceResult<TaskView> {
        let id = request.task_id;
        let current = require_task(self.repository.as_ref(), id).await?;
        current.ensure_completable()?;
        if current.lifecycle().is_completed() {
            debug!(task_id = %id, "task already completed");
            return detailed_view(&self.repository, id).await;
        }
        let learnings = request
            .learnings
            .iter()
            .map(|content| Learning::new(id, content.as_str(), &*self.clock))
            .collect::<Result<Vec<_>, _>>()?;
        self.require_repository().await?;

        let snapshot = self.repository.snapshot().await?;
        let depth = snapshot.compute_depth(id);
        let message = self
            .config
            .render_commit_message(&current, request.result.as_deref(), depth)?;
        let position = self.commit(&message).await?;

        let clock = Arc::clone(&self.clock);
        let result = request.result;
        let task = self
            .repository
            .modify(id, move |task: &mut Task| -> TaskServiceResult<()> {
                Ok(task.complete(result, Some(position), &*clock)?)
            })
            .await?;
        info!(task_id = %id, commit = ?task.commit_sha(), "task completed");

        for learning in &learnings {
            self.repository.attach_learning(learning).await?;
        }
        self.learnings.bubble_to_parent(&task).await?;

        self.release_bookmark(&task).await;
        if depth == 0 {
            for descendant in self.repository.find_descendants(id).await? {
                self.release_bookmark(&descendant).await;
            }
        }
        detailed_view(&self.repository, id).await
    }

    /// Retries bookmark deletion for a task and all of its descendants.
    ///
    /// Tasks without a recorded bookmark are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] for unknown ids and
    /// [`VcsError::NotARepository`] outside a repository. Individual
    /// deletion failures are reported in the returned sweep.
    pub async fn cleanup_bookmarks(&self, id: TaskId) -> TaskServiceResult<BookmarkSweep> {
        let root = require_task(self.repository.as_ref(), id).await?;
        self.require_repository().await?;

        let mut sweep = BookmarkSweep::default();
        let descendants = self.repository.find_descendants(id).await?;
        for task in std::iter::once(root).chain(descendants) {
            if task.bookmark().is_none() {
                continue;
            }
            if self.release_bookmark(&task).await {
                sweep.released.push(task.id());
            } else {
                sweep.retained.push(task.id());
            }
        }
        info!(
            task_id = %id,
            released = sweep.released.len(),
            retained = sweep.retained.len(),
            "bookmark sweep finished"
        );
        Ok(sweep)
    }

    async fn require_repository(&self) -> TaskServiceResult<()> {
        match self.vcs.detect().await? {
            Some(kind) => {
                debug!(repo_kind = %kind, "repository detected");
                Ok(())
            }
            None => Err(VcsError::NotARepository.into()),
        }
    }

    async fn commit(&self, message: &str) -> TaskServiceResult<PositionRef> {
        match self.vcs.commit_all(message).await? {
            CommitOutcome::Committed(position) => Ok(position),
            CommitOutcome::NothingToCommit => {
                debug!("nothing to commit; recording current position");
                Ok(self.vcs.current_position().await?)
            }
        }
    }

    /// Deletes the task's bookmark and clears the recorded name.
    ///
    /// The name stays recorded when deletion fails so a later sweep can
    /// retry. Returns `true` when the record was cleared.
    async fn release_bookmark(&self, task: &Task) -> bool {
        let Some(bookmark) = task.bookmark() else {
            return true;
        };
        match self.vcs.delete_bookmark(bookmark).await {
            Ok(()) | Err(VcsError::BookmarkNotFound(_)) => {}
            Err(err) => {
                warn!(
                    task_id = %task.id(),
                    bookmark = %bookmark,
                    error = %err,
                    "failed to delete bookmark; keeping it recorded"
                );
                return false;
            }
        }
        if let Err(err) = self.repository.clear_bookmark(task.id()).await {
            warn!(
                task_id = %task.id(),
                bookmark = %bookmark,
                error = %err,
                "deleted bookmark but failed to clear its record"
            );
            return false;
        }
        debug!(task_id = %task.id(), bookmark = %bookmark, "bookmark released");
        true
    }
}
