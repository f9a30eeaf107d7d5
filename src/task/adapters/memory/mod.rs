//! In-memory adapters for tests and embedded use.

mod task;
mod vcs;

pub use task::InMemoryTaskRepository;
pub use vcs::InMemoryVcs;
