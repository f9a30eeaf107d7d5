//! Adapter implementations of the task ports.
//!
//! - [`memory`]: in-process repository and version-control double
//! - [`sqlite`]: Diesel-backed `SQLite` repository
//! - [`git`]: version control through the `git` executable

pub mod git;
pub mod memory;
mod ordering;
pub mod sqlite;
