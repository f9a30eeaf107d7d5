//! Progressive context and learning inheritance.
//!
//! A task sees its own context plus that of its ancestors, gated by depth:
//!
//! | depth | own | parent | milestone |
//! |-------|-----|--------|-----------|
//! | 0     | yes | no     | no        |
//! | 1     | yes | no     | yes       |
//! | 2     | yes | yes    | yes       |
//!
//! At depth 1 the parent is the milestone, so it is reported once under
//! `milestone`.

use super::{Learning, Task};
use serde::{Deserialize, Serialize};

/// Context visible to a task, assembled from its ancestor chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextChain {
    /// The task's own context.
    pub own: String,
    /// Context of the direct parent, for depth-2 tasks with non-empty
    /// parent context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Context of the root milestone, for non-root tasks with non-empty
    /// milestone context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,
}

impl ContextChain {
    /// Builds the chain for `task` from its ancestors, nearest first.
    #[must_use]
    pub fn build(task: &Task, ancestors: &[Task]) -> Self {
        let (parent, milestone) = gate_by_depth(ancestors);
        Self {
            own: task.context().to_owned(),
            parent: parent.and_then(non_empty_context),
            milestone: milestone.and_then(non_empty_context),
        }
    }
}

fn non_empty_context(task: &Task) -> Option<String> {
    let context = task.context();
    (!context.is_empty()).then(|| context.to_owned())
}

/// Learnings visible to a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InheritedLearnings {
    /// Learnings held by the task itself, including those bubbled up from
    /// its completed children.
    pub own: Vec<Learning>,
    /// Learnings held by the direct parent, for depth-2 tasks.
    pub parent: Vec<Learning>,
    /// Learnings held by the root milestone, for non-root tasks.
    pub milestone: Vec<Learning>,
}

impl InheritedLearnings {
    /// Builds the bundle from the task's own learnings and those held by
    /// each ancestor, nearest first.
    #[must_use]
    pub fn build(own: Vec<Learning>, mut by_ancestor: Vec<Vec<Learning>>) -> Self {
        let depth = by_ancestor.len();
        let milestone = by_ancestor.pop().unwrap_or_default();
        let parent = if depth >= 2 {
            by_ancestor.into_iter().next().unwrap_or_default()
        } else {
            Vec::new()
        };
        Self {
            own,
            parent,
            milestone,
        }
    }
}

/// Picks the parent and milestone entries from an ancestor chain, nearest
/// first.
fn gate_by_depth<T>(ancestors: &[T]) -> (Option<&T>, Option<&T>) {
    match ancestors {
        [] => (None, None),
        [milestone] => (None, Some(milestone)),
        [parent, .., milestone] => (Some(parent), Some(milestone)),
    }
}
