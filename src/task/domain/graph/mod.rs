//! Hierarchy and dependency graph checks.
//!
//! Every check runs over a [`GraphSnapshot`] built from a fresh read of the
//! store. Nothing here is cached between operations, and every walk over
//! ancestors, descendants or blockers is iterative.

mod resolve;
mod snapshot;
mod validate;

pub use snapshot::{GraphNode, GraphSnapshot};
pub use validate::{GraphViolation, HierarchyRelation, StructuralChange};

/// Deepest allowed level. Roots sit at depth 0.
pub const MAX_DEPTH: usize = 2;
