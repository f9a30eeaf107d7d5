//! Work selection: which task to start, and which task is ready next.

use super::GraphSnapshot;
use crate::task::domain::TaskId;
use std::collections::HashSet;

/// One candidate produced while resolving a start target.
enum StartStep {
    /// An unblocked leaf that can be started as is.
    Start(TaskId),
    /// A blocker that has to be worked on first.
    Follow(TaskId),
}

/// Traversal marker for the ready search.
enum Visit {
    Enter { id: TaskId, ancestors_unblocked: bool },
    Leave { id: TaskId, startable: bool },
}

impl GraphSnapshot {
    /// Returns the deepest incomplete path ends below `root`, root first, in
    /// priority order.
    ///
    /// A node whose children are all finished counts as a leaf.
    #[must_use]
    pub fn incomplete_leaf_paths(&self, root: TaskId) -> Vec<Vec<TaskId>> {
        let mut paths = Vec::new();
        let mut stack = vec![vec![root]];
        while let Some(path) = stack.pop() {
            let Some(&current) = path.last() else {
                continue;
            };
            if !self.contains(current) || self.is_finished_for_hierarchy(current) {
                continue;
            }
            let open_children: Vec<TaskId> = self
                .children_of(current)
                .into_iter()
                .filter(|child| !self.is_finished_for_hierarchy(*child))
                .collect();
            if open_children.is_empty() {
                paths.push(path);
                continue;
            }
            for child in open_children.into_iter().rev() {
                let mut extended = path.clone();
                extended.push(child);
                stack.push(extended);
            }
        }
        paths
    }

    /// Resolves the task that should actually be started when `requested`
    /// is asked for.
    ///
    /// Picks the first incomplete leaf below `requested` whose chain (the
    /// leaf, everything between it and `requested`, and the ancestors of
    /// `requested`) has no unsatisfied blocker. When every leaf is blocked,
    /// follows the unsatisfied blockers and searches below them the same way.
    /// Each blocker is explored at most once.
    ///
    /// Returns `None` when nothing reachable is startable.
    #[must_use]
    pub fn resolve_start_target(&self, requested: TaskId) -> Option<TaskId> {
        let mut explored = HashSet::from([requested]);
        let mut frames = vec![self.start_steps(requested)];

        while let Some(steps) = frames.last_mut() {
            let Some(step) = steps.pop() else {
                frames.pop();
                continue;
            };
            match step {
                StartStep::Start(leaf) => return Some(leaf),
                StartStep::Follow(blocker) => {
                    if explored.insert(blocker) {
                        let next = self.start_steps(blocker);
                        frames.push(next);
                    }
                }
            }
        }
        None
    }

    /// Candidate steps for `root`, stored in reverse so `pop` yields them in
    /// priority order.
    fn start_steps(&self, root: TaskId) -> Vec<StartStep> {
        let mut inherited: Vec<TaskId> = self.ancestors(root);
        inherited.reverse();

        let mut steps = Vec::new();
        for path in self.incomplete_leaf_paths(root) {
            let chain = inherited.iter().chain(path.iter());
            let blockage = chain
                .map(|node| self.unsatisfied_blockers(*node))
                .find(|unsatisfied| !unsatisfied.is_empty());
            match blockage {
                Some(unsatisfied) => steps.extend(unsatisfied.into_iter().map(StartStep::Follow)),
                None => {
                    if let Some(&leaf) = path.last() {
                        steps.push(StartStep::Start(leaf));
                    }
                }
            }
        }
        steps.reverse();
        steps
    }

    /// Finds the next task ready for work.
    ///
    /// Searches below `root`, or below every root in priority order when
    /// `root` is `None`. Depth first in priority order: the deepest active
    /// leaf that is not effectively blocked wins. A node whose children are
    /// all finished is returned itself when it is not blocked.
    #[must_use]
    pub fn next_ready(&self, root: Option<TaskId>) -> Option<TaskId> {
        let starts = root.map_or_else(|| self.roots(), |id| vec![id]);
        let mut stack: Vec<Visit> = starts
            .into_iter()
            .rev()
            .map(|id| Visit::Enter {
                ancestors_unblocked: !self
                    .ancestors(id)
                    .into_iter()
                    .any(|ancestor| !self.unsatisfied_blockers(ancestor).is_empty()),
                id,
            })
            .collect();

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter {
                    id,
                    ancestors_unblocked,
                } => {
                    if !self.is_active_for_work(id) {
                        continue;
                    }
                    let unblocked =
                        ancestors_unblocked && self.unsatisfied_blockers(id).is_empty();
                    let children = self.children_of(id);
                    if children.is_empty() {
                        if unblocked {
                            return Some(id);
                        }
                        continue;
                    }
                    let all_finished = children
                        .iter()
                        .all(|child| self.is_finished_for_hierarchy(*child));
                    stack.push(Visit::Leave {
                        id,
                        startable: all_finished && unblocked,
                    });
                    stack.extend(children.into_iter().rev().map(|child| Visit::Enter {
                        id: child,
                        ancestors_unblocked: unblocked,
                    }));
                }
                Visit::Leave { id, startable } => {
                    if startable {
                        return Some(id);
                    }
                }
            }
        }
        None
    }
}
