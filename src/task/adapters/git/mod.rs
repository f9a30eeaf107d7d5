//! Version control through the `git` command-line tool.

mod backend;

pub use backend::GitCliBackend;
