//! Structural validation of hierarchy and blocker changes.

use super::{GraphSnapshot, MAX_DEPTH};
use crate::task::domain::{LifecycleState, TaskId};
use std::fmt;
use thiserror::Error;

/// A structural change awaiting validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralChange {
    /// A new task joins the graph.
    Insert {
        /// Identifier of the new task.
        task_id: TaskId,
        /// Requested parent.
        parent_id: Option<TaskId>,
        /// Requested initial blockers.
        blocked_by: Vec<TaskId>,
    },
    /// An existing task moves to another parent or to the root level.
    Reparent {
        /// Task being moved.
        task_id: TaskId,
        /// New parent, or `None` to become a root.
        parent_id: Option<TaskId>,
    },
    /// An existing task gains a blocker.
    AddBlocker {
        /// Task that becomes blocked.
        task_id: TaskId,
        /// Task it is blocked by.
        blocker_id: TaskId,
    },
}

/// How a rejected blocker relates to the blocked task in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyRelation {
    /// The blocker is an ancestor of the blocked task.
    Ancestor,
    /// The blocker is a descendant of the blocked task.
    Descendant,
}

impl fmt::Display for HierarchyRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ancestor => f.write_str("ancestor"),
            Self::Descendant => f.write_str("descendant"),
        }
    }
}

/// Rejected structural change. Every variant names the relationship that
/// would have been broken.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphViolation {
    /// The task being changed does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The requested parent does not exist.
    #[error("parent {parent_id} of task {task_id} not found")]
    ParentNotFound {
        /// Task being placed.
        task_id: TaskId,
        /// Missing parent.
        parent_id: TaskId,
    },

    /// The requested blocker does not exist.
    #[error("blocker {blocker_id} of task {task_id} not found")]
    BlockerNotFound {
        /// Task being blocked.
        task_id: TaskId,
        /// Missing blocker.
        blocker_id: TaskId,
    },

    /// The parent change would make a task its own ancestor.
    #[error("making {parent_id} the parent of {task_id} would create a parent cycle")]
    ParentCycle {
        /// Task being moved.
        task_id: TaskId,
        /// Proposed parent.
        parent_id: TaskId,
    },

    /// The blocker edge would make the blocker relation cyclic.
    #[error("blocking {task_id} by {blocker_id} would create a blocker cycle")]
    BlockerCycle {
        /// Task being blocked.
        task_id: TaskId,
        /// Proposed blocker.
        blocker_id: TaskId,
    },

    /// A task may not be blocked by its own ancestor or descendant.
    #[error("task {task_id} cannot be blocked by its {relation} {blocker_id}")]
    BlockerInHierarchy {
        /// Task that would be blocked.
        task_id: TaskId,
        /// Offending blocker.
        blocker_id: TaskId,
        /// Relation of the blocker to the task.
        relation: HierarchyRelation,
    },

    /// The change would place a task deeper than the maximum depth.
    #[error(
        "placing {task_id} under {parent_id} reaches depth {depth}, maximum is {max_depth}"
    )]
    DepthExceeded {
        /// Task being placed.
        task_id: TaskId,
        /// Proposed parent.
        parent_id: TaskId,
        /// Deepest level the change would produce.
        depth: usize,
        /// Maximum allowed depth.
        max_depth: usize,
    },

    /// Children may only be attached to parents still open for work.
    #[error("cannot attach {task_id} under {parent_id} which is {state}")]
    InactiveParent {
        /// Task being placed.
        task_id: TaskId,
        /// Proposed parent.
        parent_id: TaskId,
        /// Lifecycle state of the parent.
        state: LifecycleState,
    },
}

impl GraphViolation {
    /// Returns a stable machine-readable code for the error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::TaskNotFound(_) => "task_not_found",
            Self::ParentNotFound { .. } => "parent_not_found",
            Self::BlockerNotFound { .. } => "blocker_not_found",
            Self::ParentCycle { .. } => "parent_cycle",
            Self::BlockerCycle { .. } => "blocker_cycle",
            Self::BlockerInHierarchy { .. } => "blocker_in_hierarchy",
            Self::DepthExceeded { .. } => "depth_exceeded",
            Self::InactiveParent { .. } => "inactive_parent",
        }
    }
}

impl GraphSnapshot {
    /// Validates a structural change against this snapshot.
    ///
    /// Checks run in a fixed order: existence, cycles, hierarchy relations of
    /// blockers, depth, then parent activity. The first failure wins.
    ///
    /// # Errors
    ///
    /// Returns the first [`GraphViolation`] the change would cause.
    pub fn validate(&self, change: &StructuralChange) -> Result<(), GraphViolation> {
        match change {
            StructuralChange::Insert {
                task_id,
                parent_id,
                blocked_by,
            } => self.validate_insert(*task_id, *parent_id, blocked_by),
            StructuralChange::Reparent { task_id, parent_id } => {
                self.validate_reparent(*task_id, *parent_id)
            }
            StructuralChange::AddBlocker {
                task_id,
                blocker_id,
            } => self.validate_add_blocker(*task_id, *blocker_id),
        }
    }

    fn validate_insert(
        &self,
        task_id: TaskId,
        parent_id: Option<TaskId>,
        blocked_by: &[TaskId],
    ) -> Result<(), GraphViolation> {
        if let Some(parent) = parent_id {
            self.require_parent(task_id, parent)?;
        }
        for blocker_id in blocked_by {
            self.require_blocker(task_id, *blocker_id)?;
        }
        // A task not yet in the graph has no edges, so no cycle check applies.
        if let Some(parent) = parent_id {
            for blocker_id in blocked_by {
                if *blocker_id == parent || self.is_ancestor(*blocker_id, parent) {
                    return Err(GraphViolation::BlockerInHierarchy {
                        task_id,
                        blocker_id: *blocker_id,
                        relation: HierarchyRelation::Ancestor,
                    });
                }
            }
            self.check_depth(task_id, parent, 0)?;
            self.check_parent_active(task_id, parent)?;
        }
        Ok(())
    }

    fn validate_reparent(
        &self,
        task_id: TaskId,
        parent_id: Option<TaskId>,
    ) -> Result<(), GraphViolation> {
        self.require_task(task_id)?;
        let Some(parent) = parent_id else {
            return Ok(());
        };
        self.require_parent(task_id, parent)?;
        if self.would_create_parent_cycle(task_id, parent) {
            return Err(GraphViolation::ParentCycle {
                task_id,
                parent_id: parent,
            });
        }
        self.check_moved_subtree_relations(task_id, parent)?;
        self.check_depth(task_id, parent, self.subtree_height(task_id))?;
        self.check_parent_active(task_id, parent)
    }

    fn validate_add_blocker(&self, task_id: TaskId, blocker_id: TaskId) -> Result<(), GraphViolation> {
        self.require_task(task_id)?;
        self.require_blocker(task_id, blocker_id)?;
        if self.would_create_blocker_cycle(task_id, blocker_id) {
            return Err(GraphViolation::BlockerCycle {
                task_id,
                blocker_id,
            });
        }
        if self.is_ancestor(blocker_id, task_id) {
            return Err(GraphViolation::BlockerInHierarchy {
                task_id,
                blocker_id,
                relation: HierarchyRelation::Ancestor,
            });
        }
        if self.is_ancestor(task_id, blocker_id) {
            return Err(GraphViolation::BlockerInHierarchy {
                task_id,
                blocker_id,
                relation: HierarchyRelation::Descendant,
            });
        }
        Ok(())
    }

    /// After the move, every node in the moved subtree gains the new parent
    /// and its ancestors as ancestors. None of them may be a blocker of, or
    /// blocked by, a node in the subtree.
    fn check_moved_subtree_relations(
        &self,
        task_id: TaskId,
        parent: TaskId,
    ) -> Result<(), GraphViolation> {
        let mut new_ancestors = vec![parent];
        new_ancestors.extend(self.ancestors(parent));

        let subtree = std::iter::once(task_id).chain(self.descendants(task_id));
        for member in subtree {
            if let Some(blocker_id) = self
                .blockers_of(member)
                .into_iter()
                .find(|candidate| new_ancestors.contains(candidate))
            {
                return Err(GraphViolation::BlockerInHierarchy {
                    task_id: member,
                    blocker_id,
                    relation: HierarchyRelation::Ancestor,
                });
            }
            if let Some(blocked) = self
                .blocking(member)
                .into_iter()
                .find(|candidate| new_ancestors.contains(candidate))
            {
                return Err(GraphViolation::BlockerInHierarchy {
                    task_id: blocked,
                    blocker_id: member,
                    relation: HierarchyRelation::Descendant,
                });
            }
        }
        Ok(())
    }

    fn check_depth(
        &self,
        task_id: TaskId,
        parent: TaskId,
        subtree_height: usize,
    ) -> Result<(), GraphViolation> {
        let depth = self.compute_depth(parent) + 1 + subtree_height;
        if depth > MAX_DEPTH {
            return Err(GraphViolation::DepthExceeded {
                task_id,
                parent_id: parent,
                depth,
                max_depth: MAX_DEPTH,
            });
        }
        Ok(())
    }

    fn check_parent_active(&self, task_id: TaskId, parent: TaskId) -> Result<(), GraphViolation> {
        match self.node(parent) {
            Some(node) if !node.lifecycle().is_active_for_work() => {
                Err(GraphViolation::InactiveParent {
                    task_id,
                    parent_id: parent,
                    state: node.lifecycle().state(),
                })
            }
            _ => Ok(()),
        }
    }

    fn require_task(&self, task_id: TaskId) -> Result<(), GraphViolation> {
        if self.contains(task_id) {
            Ok(())
        } else {
            Err(GraphViolation::TaskNotFound(task_id))
        }
    }

    fn require_parent(&self, task_id: TaskId, parent_id: TaskId) -> Result<(), GraphViolation> {
        if self.contains(parent_id) {
            Ok(())
        } else {
            Err(GraphViolation::ParentNotFound { task_id, parent_id })
        }
    }

    fn require_blocker(&self, task_id: TaskId, blocker_id: TaskId) -> Result<(), GraphViolation> {
        if self.contains(blocker_id) {
            Ok(())
        } else {
            Err(GraphViolation::BlockerNotFound {
                task_id,
                blocker_id,
            })
        }
    }
}
