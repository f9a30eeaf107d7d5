//! `SQLite` adapters for task hierarchy persistence.

mod connection;
mod models;
mod repository;
mod schema;

pub use connection::{SqliteConfig, TaskSqlitePool, open_file, open_in_memory};
pub use repository::SqliteTaskRepository;
