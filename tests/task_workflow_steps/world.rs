//! Shared world state for task workflow BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use cairn::task::{
    adapters::memory::{InMemoryTaskRepository, InMemoryVcs},
    domain::TaskId,
    services::{
        LearningService, LifecycleService, TaskService, TaskServiceError, WorkflowConfig,
        WorkflowCoordinator,
    },
};
use mockable::DefaultClock;
use rstest::fixture;

/// Scenario world for task workflow behaviour tests.
pub struct TaskWorkflowWorld {
    pub tasks: TaskService<InMemoryTaskRepository, DefaultClock>,
    pub lifecycle: LifecycleService<InMemoryTaskRepository, DefaultClock>,
    pub learnings: LearningService<InMemoryTaskRepository, DefaultClock>,
    pub workflow: WorkflowCoordinator<InMemoryTaskRepository, InMemoryVcs, DefaultClock>,
    pub vcs: Arc<InMemoryVcs>,
    pub named: HashMap<String, TaskId>,
    pub last_error: Option<TaskServiceError>,
}

impl TaskWorkflowWorld {
    /// Creates a world over fresh in-memory adapters.
    #[must_use]
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryTaskRepository::new());
        let clock = Arc::new(DefaultClock);
        let vcs = Arc::new(InMemoryVcs::new());
        Self {
            tasks: TaskService::new(Arc::clone(&repository), Arc::clone(&clock)),
            lifecycle: LifecycleService::new(Arc::clone(&repository), Arc::clone(&clock)),
            learnings: LearningService::new(Arc::clone(&repository), Arc::clone(&clock)),
            workflow: WorkflowCoordinator::new(
                repository,
                Arc::clone(&vcs),
                clock,
                WorkflowConfig::default(),
            ),
            vcs,
            named: HashMap::new(),
            last_error: None,
        }
    }

    /// Looks up a task by its scenario name.
    ///
    /// # Errors
    ///
    /// Returns an error when no task was registered under `name`.
    pub fn task(&self, name: &str) -> Result<TaskId, eyre::Report> {
        self.named
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("no task named '{name}' in scenario world"))
    }
}

impl Default for TaskWorkflowWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskWorkflowWorld {
    TaskWorkflowWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
