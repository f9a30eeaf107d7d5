//! Shared fixtures for in-memory orchestration integration tests.

use std::sync::Arc;

use cairn::task::{
    adapters::memory::{InMemoryTaskRepository, InMemoryVcs},
    domain::TaskId,
    services::{
        CreateTaskRequest, LearningService, LifecycleService, TaskService, WorkflowConfig,
        WorkflowCoordinator,
    },
};
use mockable::DefaultClock;
use rstest::fixture;

/// Every service wired to one repository and one working copy.
pub struct Orchestrator {
    pub tasks: TaskService<InMemoryTaskRepository, DefaultClock>,
    pub lifecycle: LifecycleService<InMemoryTaskRepository, DefaultClock>,
    pub learnings: LearningService<InMemoryTaskRepository, DefaultClock>,
    pub workflow: WorkflowCoordinator<InMemoryTaskRepository, InMemoryVcs, DefaultClock>,
    pub vcs: Arc<InMemoryVcs>,
}

impl Orchestrator {
    /// Wires fresh in-memory adapters with the given configuration.
    #[must_use]
    pub fn with_config(config: WorkflowConfig) -> Self {
        let repository = Arc::new(InMemoryTaskRepository::new());
        let clock = Arc::new(DefaultClock);
        let vcs = Arc::new(InMemoryVcs::new());
        Self {
            tasks: TaskService::new(Arc::clone(&repository), Arc::clone(&clock)),
            lifecycle: LifecycleService::new(Arc::clone(&repository), Arc::clone(&clock)),
            learnings: LearningService::new(Arc::clone(&repository), Arc::clone(&clock)),
            workflow: WorkflowCoordinator::new(repository, Arc::clone(&vcs), clock, config),
            vcs,
        }
    }

    /// Creates a task and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the request.
    pub async fn create(&self, request: CreateTaskRequest) -> Result<TaskId, eyre::Report> {
        Ok(self.tasks.create(request).await?.id)
    }
}

/// Provides an orchestrator with the default configuration.
#[fixture]
pub fn orchestrator() -> Orchestrator {
    Orchestrator::with_config(WorkflowConfig::default())
}
