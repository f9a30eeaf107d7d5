//! Application services orchestrating task hierarchies.
//!
//! Each service is generic over its ports so tests can swap in the
//! in-memory adapters:
//!
//! - [`TaskService`]: create, read, edit, delete and blocker edges
//! - [`LifecycleService`]: cancel, archive and reopen
//! - [`LearningService`]: learning notes and bubbling
//! - [`WorkflowCoordinator`]: start and complete with version-control effects

mod config;
mod context;
mod error;
mod learnings;
mod lifecycle;
mod tasks;
mod view;
mod workflow;

pub use config::{
    DEFAULT_BOOKMARK_PREFIX, DEFAULT_COMMIT_TEMPLATE, DEFAULT_MILESTONE_COMMIT_TEMPLATE,
    WorkflowConfig,
};
pub use context::ContextAssembler;
pub use error::{TaskServiceError, TaskServiceResult};
pub use learnings::LearningService;
pub use lifecycle::LifecycleService;
pub use tasks::{CreateTaskRequest, TaskService, UpdateTaskRequest};
pub use workflow::{BookmarkSweep, CompleteTaskRequest, WorkflowCoordinator};
