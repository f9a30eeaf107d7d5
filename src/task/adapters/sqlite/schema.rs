//! Diesel schema for task hierarchy persistence.
//!
//! Identifiers are stored as hyphenated UUID text and timestamps as
//! RFC 3339 text.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Task identifier.
        id -> Text,
        /// Parent task identifier, `NULL` for roots.
        parent_id -> Nullable<Text>,
        /// Short description.
        description -> Text,
        /// Own context text.
        context -> Text,
        /// Completion result.
        result -> Nullable<Text>,
        /// Priority, 0 (highest) to 2 (lowest).
        priority -> Integer,
        /// When work started.
        started_at -> Nullable<Text>,
        /// When the task completed.
        completed_at -> Nullable<Text>,
        /// When the task was cancelled.
        cancelled_at -> Nullable<Text>,
        /// When the task was archived.
        archived_at -> Nullable<Text>,
        /// Bookmark created at start.
        bookmark -> Nullable<Text>,
        /// Revision recorded at start.
        start_commit -> Nullable<Text>,
        /// Revision recorded at completion.
        commit_sha -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Text,
        /// Last update timestamp.
        updated_at -> Text,
    }
}

diesel::table! {
    /// Blocker edges: `task_id` waits for `blocker_id`.
    task_blockers (task_id, blocker_id) {
        /// Blocked task.
        task_id -> Text,
        /// Blocking task.
        blocker_id -> Text,
    }
}

diesel::table! {
    /// Learning notes.
    learnings (id) {
        /// Learning identifier.
        id -> Text,
        /// Holder task.
        task_id -> Text,
        /// Note text.
        content -> Text,
        /// Task that originally recorded the note.
        source_task_id -> Text,
        /// Creation timestamp.
        created_at -> Text,
    }
}

/// Statements creating the schema. Safe to run repeatedly.
pub const CREATE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY NOT NULL,
    parent_id TEXT REFERENCES tasks (id) ON DELETE CASCADE,
    description TEXT NOT NULL,
    context TEXT NOT NULL DEFAULT '',
    result TEXT,
    priority INTEGER NOT NULL DEFAULT 1 CHECK (priority BETWEEN 0 AND 2),
    started_at TEXT,
    completed_at TEXT,
    cancelled_at TEXT,
    archived_at TEXT,
    bookmark TEXT,
    start_commit TEXT,
    commit_sha TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tasks_parent ON tasks (parent_id);
CREATE TABLE IF NOT EXISTS task_blockers (
    task_id TEXT NOT NULL REFERENCES tasks (id) ON DELETE CASCADE,
    blocker_id TEXT NOT NULL REFERENCES tasks (id) ON DELETE CASCADE,
    PRIMARY KEY (task_id, blocker_id)
);
CREATE INDEX IF NOT EXISTS idx_task_blockers_blocker ON task_blockers (blocker_id);
CREATE TABLE IF NOT EXISTS learnings (
    id TEXT PRIMARY KEY NOT NULL,
    task_id TEXT NOT NULL REFERENCES tasks (id) ON DELETE CASCADE,
    content TEXT NOT NULL,
    source_task_id TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_learnings_task ON learnings (task_id);
";
