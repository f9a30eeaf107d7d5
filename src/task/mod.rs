//! Hierarchical task orchestration.
//!
//! Tasks form a forest at most three levels deep (milestone, task, subtask),
//! with blocker edges between arbitrary tasks. Every structural change is
//! validated against a fresh snapshot of the graph, lifecycle state is
//! derived from timestamps, and starting or completing work drives a
//! version-control working copy. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
