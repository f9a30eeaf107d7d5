//! Point-in-time view of parent links, blocker edges and lifecycle flags.

use crate::task::domain::{LifecycleTimestamps, Priority, Task, TaskId};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Graph-relevant facts about one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    parent: Option<TaskId>,
    priority: Priority,
    created_at: DateTime<Utc>,
    lifecycle: LifecycleTimestamps,
    blockers: BTreeSet<TaskId>,
}

impl GraphNode {
    /// Returns the parent identifier.
    #[must_use]
    pub const fn parent(&self) -> Option<TaskId> {
        self.parent
    }

    /// Returns the lifecycle timestamps.
    #[must_use]
    pub const fn lifecycle(&self) -> &LifecycleTimestamps {
        &self.lifecycle
    }

    /// Returns the tasks this node is blocked by.
    #[must_use]
    pub const fn blockers(&self) -> &BTreeSet<TaskId> {
        &self.blockers
    }
}

/// Whole-graph snapshot used for structural validation and derived status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphSnapshot {
    nodes: HashMap<TaskId, GraphNode>,
}

impl GraphSnapshot {
    /// Builds a snapshot from tasks and `(task, blocker)` edges.
    ///
    /// Edges referring to tasks missing from `tasks` are ignored.
    #[must_use]
    pub fn from_parts<'a>(
        tasks: impl IntoIterator<Item = &'a Task>,
        edges: impl IntoIterator<Item = (TaskId, TaskId)>,
    ) -> Self {
        let mut nodes: HashMap<TaskId, GraphNode> = tasks
            .into_iter()
            .map(|task| {
                (
                    task.id(),
                    GraphNode {
                        parent: task.parent_id(),
                        priority: task.priority(),
                        created_at: task.created_at(),
                        lifecycle: *task.lifecycle(),
                        blockers: BTreeSet::new(),
                    },
                )
            })
            .collect();

        for (task_id, blocker_id) in edges {
            if !nodes.contains_key(&blocker_id) {
                continue;
            }
            if let Some(node) = nodes.get_mut(&task_id) {
                node.blockers.insert(blocker_id);
            }
        }

        Self { nodes }
    }

    /// Returns the number of tasks in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` when the snapshot holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` when the task exists.
    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Returns the node for a task.
    #[must_use]
    pub fn node(&self, id: TaskId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    /// Returns the parent of a task.
    #[must_use]
    pub fn parent_of(&self, id: TaskId) -> Option<TaskId> {
        self.nodes.get(&id).and_then(GraphNode::parent)
    }

    /// Returns the tasks `id` is blocked by, in identifier order.
    #[must_use]
    pub fn blockers_of(&self, id: TaskId) -> Vec<TaskId> {
        self.nodes
            .get(&id)
            .map(|node| node.blockers.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the tasks blocked by `id`, in identifier order.
    #[must_use]
    pub fn blocking(&self, id: TaskId) -> Vec<TaskId> {
        let mut blocked: Vec<TaskId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.blockers.contains(&id))
            .map(|(task_id, _)| *task_id)
            .collect();
        blocked.sort_unstable();
        blocked
    }

    /// Returns the direct children of `id`, most urgent first and then in
    /// creation order.
    #[must_use]
    pub fn children_of(&self, id: TaskId) -> Vec<TaskId> {
        self.ordered(|node| node.parent == Some(id))
    }

    /// Returns all root tasks, most urgent first and then in creation order.
    #[must_use]
    pub fn roots(&self) -> Vec<TaskId> {
        self.ordered(|node| node.parent.is_none())
    }

    fn ordered(&self, include: impl Fn(&GraphNode) -> bool) -> Vec<TaskId> {
        let mut selected: Vec<(&TaskId, &GraphNode)> = self
            .nodes
            .iter()
            .filter(|(_, node)| include(node))
            .collect();
        selected.sort_by(|(left_id, left), (right_id, right)| {
            left.priority
                .cmp(&right.priority)
                .then(left.created_at.cmp(&right.created_at))
                .then(left_id.cmp(right_id))
        });
        selected.into_iter().map(|(id, _)| *id).collect()
    }

    /// Returns the ancestors of `id`, nearest first.
    ///
    /// Stops early if a corrupted parent chain loops back on itself.
    #[must_use]
    pub fn ancestors(&self, id: TaskId) -> Vec<TaskId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.parent_of(id);
        while let Some(ancestor) = current {
            if !seen.insert(ancestor) {
                break;
            }
            chain.push(ancestor);
            current = self.parent_of(ancestor);
        }
        chain
    }

    /// Depth of a task: the number of ancestors. Roots have depth 0.
    #[must_use]
    pub fn compute_depth(&self, id: TaskId) -> usize {
        self.ancestors(id).len()
    }

    /// Returns the root of the hierarchy containing `id`.
    #[must_use]
    pub fn root_of(&self, id: TaskId) -> TaskId {
        self.ancestors(id).last().copied().unwrap_or(id)
    }

    /// Returns every descendant of `id` in breadth-first order.
    #[must_use]
    pub fn descendants(&self, id: TaskId) -> Vec<TaskId> {
        let mut found = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for child in self.children_of(current) {
                if seen.insert(child) {
                    found.push(child);
                    queue.push_back(child);
                }
            }
        }
        found
    }

    /// Number of levels below `id`. A leaf has height 0.
    #[must_use]
    pub fn subtree_height(&self, id: TaskId) -> usize {
        let mut height = 0;
        let mut seen = HashSet::from([id]);
        let mut level = vec![id];
        loop {
            let next: Vec<TaskId> = level
                .iter()
                .flat_map(|node| self.children_of(*node))
                .filter(|child| seen.insert(*child))
                .collect();
            if next.is_empty() {
                return height;
            }
            height += 1;
            level = next;
        }
    }

    /// Returns `true` when `candidate` is a strict ancestor of `id`.
    #[must_use]
    pub fn is_ancestor(&self, candidate: TaskId, id: TaskId) -> bool {
        self.ancestors(id).contains(&candidate)
    }

    /// Returns `true` when making `proposed_parent` the parent of `task`
    /// would close a loop in the parent chain.
    ///
    /// Walks up from the proposed parent and stops at the first match.
    #[must_use]
    pub fn would_create_parent_cycle(&self, task: TaskId, proposed_parent: TaskId) -> bool {
        if task == proposed_parent {
            return true;
        }
        let mut seen = HashSet::new();
        let mut current = Some(proposed_parent);
        while let Some(ancestor) = current {
            if ancestor == task {
                return true;
            }
            if !seen.insert(ancestor) {
                return false;
            }
            current = self.parent_of(ancestor);
        }
        false
    }

    /// Returns `true` when blocking `task` by `proposed_blocker` would close
    /// a loop in the blocker relation. Blocking a task by itself counts as a
    /// loop.
    ///
    /// Depth-first search with an explicit stack over the transitive blocker
    /// relation starting at the proposed blocker.
    #[must_use]
    pub fn would_create_blocker_cycle(&self, task: TaskId, proposed_blocker: TaskId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![proposed_blocker];
        while let Some(current) = stack.pop() {
            if current == task {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.blockers.iter().copied());
            }
        }
        false
    }

    /// Returns `true` when the blocker exists and is completed, not cancelled
    /// and not archived. Missing blockers never satisfy.
    #[must_use]
    pub fn satisfies_blocker(&self, id: TaskId) -> bool {
        self.nodes
            .get(&id)
            .is_some_and(|node| node.lifecycle.satisfies_blocker())
    }

    /// Returns the blockers of `id` that do not yet satisfy it.
    #[must_use]
    pub fn unsatisfied_blockers(&self, id: TaskId) -> Vec<TaskId> {
        self.blockers_of(id)
            .into_iter()
            .filter(|blocker| !self.satisfies_blocker(*blocker))
            .collect()
    }

    /// Returns `true` when `id` or any of its ancestors has a blocker that
    /// does not satisfy it.
    #[must_use]
    pub fn is_effectively_blocked(&self, id: TaskId) -> bool {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .any(|node| !self.unsatisfied_blockers(node).is_empty())
    }

    /// Returns `true` when the task is active and not effectively blocked.
    #[must_use]
    pub fn is_ready(&self, id: TaskId) -> bool {
        self.nodes
            .get(&id)
            .is_some_and(|node| node.lifecycle.is_active_for_work())
            && !self.is_effectively_blocked(id)
    }

    pub(super) fn is_finished_for_hierarchy(&self, id: TaskId) -> bool {
        self.nodes
            .get(&id)
            .is_some_and(|node| node.lifecycle.is_finished_for_hierarchy())
    }

    pub(super) fn is_active_for_work(&self, id: TaskId) -> bool {
        self.nodes
            .get(&id)
            .is_some_and(|node| node.lifecycle.is_active_for_work())
    }
}
