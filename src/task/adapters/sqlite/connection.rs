//! `SQLite` connection pool with foreign keys and WAL enabled.

use super::schema::CREATE_SCHEMA;
use crate::task::ports::{TaskRepositoryError, TaskRepositoryResult};
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sqlite::SqliteConnection;
use std::time::Duration;

/// `SQLite` connection pool type used by task adapters.
pub type TaskSqlitePool = Pool<ConnectionManager<SqliteConnection>>;

/// Connection pool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    /// Maximum pool size.
    pub pool_size: u32,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            pool_size: 8,
            busy_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA journal_mode = WAL;\
             PRAGMA busy_timeout = {};\
             PRAGMA foreign_keys = ON;\
             PRAGMA synchronous = NORMAL;",
            self.busy_timeout_ms
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Opens a file-backed pool and creates the schema when missing.
///
/// # Errors
///
/// Returns [`TaskRepositoryError::Persistence`] when the pool cannot be
/// built or the schema cannot be created.
pub fn open_file(path: &str, config: &SqliteConfig) -> TaskRepositoryResult<TaskSqlitePool> {
    build(path, config.pool_size, config)
}

/// Opens a private in-memory database.
///
/// Every `SQLite` connection to `:memory:` is a separate database, so the
/// pool holds exactly one connection.
///
/// # Errors
///
/// Returns [`TaskRepositoryError::Persistence`] on failure.
pub fn open_in_memory(config: &SqliteConfig) -> TaskRepositoryResult<TaskSqlitePool> {
    build(":memory:", 1, config)
}

fn build(url: &str, pool_size: u32, config: &SqliteConfig) -> TaskRepositoryResult<TaskSqlitePool> {
    let manager = ConnectionManager::<SqliteConnection>::new(url);
    let pool = Pool::builder()
        .max_size(pool_size)
        .connection_timeout(Duration::from_secs(5))
        .connection_customizer(Box::new(PragmaCustomizer {
            busy_timeout_ms: config.busy_timeout_ms,
        }))
        .build(manager)
        .map_err(TaskRepositoryError::persistence)?;
    let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
    connection
        .batch_execute(CREATE_SCHEMA)
        .map_err(TaskRepositoryError::persistence)?;
    Ok(pool)
}
