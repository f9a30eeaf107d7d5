//! Cairn: hierarchical task orchestration for coding agents.
//!
//! Agents break work into milestones, tasks and subtasks, declare which
//! tasks block which, and hand context and learnings down and up the
//! hierarchy. Starting a task creates a bookmark in the working copy and
//! completing it commits the work.
//!
//! # Architecture
//!
//! Cairn follows hexagonal architecture principles:
//!
//! - **Domain**: Pure graph, lifecycle and inheritance rules
//! - **Ports**: Abstract trait interfaces for storage and version control
//! - **Adapters**: In-memory, `SQLite` and `git` implementations of the ports
//!
//! # Modules
//!
//! - [`task`]: Task hierarchy, lifecycle and workflow coordination

pub mod task;
