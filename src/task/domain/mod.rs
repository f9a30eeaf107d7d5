//! Domain model for hierarchical task orchestration.
//!
//! Tasks form a forest at most three levels deep (milestone, task, subtask)
//! with blocker edges between arbitrary tasks. The domain keeps every rule
//! about that structure and about lifecycle transitions free of storage and
//! version-control concerns.

mod context;
mod error;
mod graph;
mod ids;
mod learning;
mod lifecycle;
mod revision;
mod task;
mod view;

pub use context::{ContextChain, InheritedLearnings};
pub use error::{ParseIdError, ParseLifecycleStateError, TaskDomainError, TransitionError};
pub use graph::{
    GraphNode, GraphSnapshot, GraphViolation, HierarchyRelation, MAX_DEPTH, StructuralChange,
};
pub use ids::{LEARNING_ID_PREFIX, LearningId, Priority, TASK_ID_PREFIX, TaskId};
pub use learning::{Learning, PersistedLearningData};
pub use lifecycle::{LifecycleState, LifecycleTimestamps};
pub use revision::{BookmarkName, PositionRef};
pub use task::{NewTaskData, PersistedTaskData, Task};
pub use view::TaskView;
