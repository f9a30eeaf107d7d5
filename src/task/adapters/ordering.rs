//! Result ordering shared by every repository adapter.

use crate::task::domain::{Learning, Task};

/// Orders tasks most urgent first, then by creation time.
pub(super) fn sort_for_listing(tasks: &mut [Task]) {
    tasks.sort_by(|left, right| {
        left.priority()
            .cmp(&right.priority())
            .then(left.created_at().cmp(&right.created_at()))
            .then(left.id().cmp(&right.id()))
    });
}

/// Orders learnings oldest first.
pub(super) fn sort_learnings(learnings: &mut [Learning]) {
    learnings.sort_by(|left, right| {
        left.created_at()
            .cmp(&right.created_at())
            .then(left.id().cmp(&right.id()))
    });
}
