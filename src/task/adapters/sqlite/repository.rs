//! `SQLite` repository implementation for task hierarchy storage.

use super::{
    connection::TaskSqlitePool,
    models::{BlockerRow, LearningRow, TaskChanges, TaskRow},
    schema::{learnings, task_blockers, tasks},
};
use crate::task::{
    adapters::ordering::{sort_for_listing, sort_learnings},
    domain::{
        BookmarkName, GraphSnapshot, Learning, LearningId, LifecycleTimestamps,
        PersistedLearningData, PersistedTaskData, PositionRef, Priority, StructuralChange, Task,
        TaskId,
    },
    ports::{TaskFilter, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;
use uuid::Uuid;

/// `SQLite`-backed task repository.
///
/// Structural writes read the graph and apply the change inside one
/// `BEGIN IMMEDIATE` transaction, which takes the database write lock up
/// front so no other writer can interleave between validation and commit.
#[derive(Debug, Clone)]
pub struct SqliteTaskRepository {
    pool: TaskSqlitePool,
}

impl SqliteTaskRepository {
    /// Creates a new repository from a connection pool.
    #[must_use]
    pub const fn new(pool: TaskSqlitePool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut SqliteConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            find_task_row(connection, id)?.map(row_to_task).transpose()
        })
        .await
    }

    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>> {
        let lookup = filter.clone();
        self.run_blocking(move |connection| {
            let mut query = tasks::table.select(TaskRow::as_select()).into_boxed();
            if let Some(parent_id) = lookup.parent_id {
                query = query.filter(tasks::parent_id.eq(id_text(parent_id)));
            }
            match lookup.completed {
                Some(true) => query = query.filter(tasks::completed_at.is_not_null()),
                Some(false) => query = query.filter(tasks::completed_at.is_null()),
                None => {}
            }
            if !lookup.include_archived {
                query = query.filter(tasks::archived_at.is_null());
            }
            let rows = query
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            let mut found = rows_to_tasks(rows)?;
            sort_for_listing(&mut found);
            Ok(found)
        })
        .await
    }

    async fn find_children(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let mut children = load_children(connection, &[id_text(id)])?;
            sort_for_listing(&mut children);
            Ok(children)
        })
        .await
    }

    async fn find_descendants(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| load_descendants(connection, id))
            .await
    }

    async fn find_blockers(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskId>> {
        self.run_blocking(move |connection| {
            let rows = task_blockers::table
                .filter(task_blockers::task_id.eq(id_text(id)))
                .select(task_blockers::blocker_id)
                .order(task_blockers::blocker_id.asc())
                .load::<String>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.iter().map(|raw| parse_task_id(raw)).collect()
        })
        .await
    }

    async fn find_blocking(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskId>> {
        self.run_blocking(move |connection| {
            let rows = task_blockers::table
                .filter(task_blockers::blocker_id.eq(id_text(id)))
                .select(task_blockers::task_id)
                .load::<String>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            let mut blocked = rows
                .iter()
                .map(|raw| parse_task_id(raw))
                .collect::<TaskRepositoryResult<Vec<_>>>()?;
            blocked.sort_unstable();
            Ok(blocked)
        })
        .await
    }

    async fn snapshot(&self) -> TaskRepositoryResult<GraphSnapshot> {
        self.run_blocking(load_snapshot).await
    }

    async fn insert(&self, task: &Task, blocked_by: &[TaskId]) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let row = task_to_row(task);
        let change = StructuralChange::Insert {
            task_id,
            parent_id: task.parent_id(),
            blocked_by: blocked_by.to_vec(),
        };
        let edges: Vec<BlockerRow> = blocked_by
            .iter()
            .map(|blocker| BlockerRow {
                task_id: id_text(task_id),
                blocker_id: id_text(*blocker),
            })
            .collect();

        self.run_blocking(move |connection| {
            connection.immediate_transaction(|tx| {
                if find_task_row(tx, task_id)?.is_some() {
                    return Err(TaskRepositoryError::DuplicateTask(task_id));
                }
                load_snapshot(tx)?.validate(&change)?;
                diesel::insert_into(tasks::table)
                    .values(&row)
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            TaskRepositoryError::DuplicateTask(task_id)
                        }
                        _ => TaskRepositoryError::persistence(err),
                    })?;
                for edge in &edges {
                    diesel::insert_or_ignore_into(task_blockers::table)
                        .values(edge)
                        .execute(tx)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn modify<F, E>(&self, id: TaskId, apply: F) -> Result<Task, E>
    where
        F: FnOnce(&mut Task) -> Result<(), E> + Send + 'static,
        E: From<TaskRepositoryError> + Send + 'static,
    {
        self.run_blocking(move |connection| {
            connection.immediate_transaction(|tx| {
                let mut task = require_task(tx, id)?;
                if let Err(err) = apply(&mut task) {
                    return Ok(Err(err));
                }
                write_changes(tx, &task)?;
                Ok(Ok(task))
            })
        })
        .await?
    }

    async fn modify_subtree<F, E>(&self, id: TaskId, apply: F) -> Result<Task, E>
    where
        F: FnOnce(&mut Task, &mut [Task]) -> Result<(), E> + Send + 'static,
        E: From<TaskRepositoryError> + Send + 'static,
    {
        self.run_blocking(move |connection| {
            connection.immediate_transaction(|tx| {
                let mut task = require_task(tx, id)?;
                let mut descendants = load_descendants(tx, id)?;
                if let Err(err) = apply(&mut task, &mut descendants) {
                    return Ok(Err(err));
                }
                for descendant in &descendants {
                    write_changes(tx, descendant)?;
                }
                write_changes(tx, &task)?;
                Ok(Ok(task))
            })
        })
        .await?
    }

    async fn reparent(
        &self,
        task_id: TaskId,
        parent_id: Option<TaskId>,
        moved_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<()> {
        let change = StructuralChange::Reparent { task_id, parent_id };
        let parent = parent_id.map(id_text);
        let updated_at = timestamp_text(moved_at);
        self.run_blocking(move |connection| {
            connection.immediate_transaction(|tx| {
                if find_task_row(tx, task_id)?.is_none() {
                    return Err(TaskRepositoryError::NotFound(task_id));
                }
                load_snapshot(tx)?.validate(&change)?;
                diesel::update(tasks::table.find(id_text(task_id)))
                    .set((tasks::parent_id.eq(parent), tasks::updated_at.eq(updated_at)))
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn add_blocker(&self, task_id: TaskId, blocker_id: TaskId) -> TaskRepositoryResult<()> {
        let change = StructuralChange::AddBlocker {
            task_id,
            blocker_id,
        };
        let edge = BlockerRow {
            task_id: id_text(task_id),
            blocker_id: id_text(blocker_id),
        };
        self.run_blocking(move |connection| {
            connection.immediate_transaction(|tx| {
                let existing = task_blockers::table
                    .find((&edge.task_id, &edge.blocker_id))
                    .count()
                    .get_result::<i64>(tx)?;
                if existing > 0 {
                    return Ok(());
                }
                load_snapshot(tx)?.validate(&change)?;
                diesel::insert_into(task_blockers::table)
                    .values(&edge)
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn remove_blocker(
        &self,
        task_id: TaskId,
        blocker_id: TaskId,
    ) -> TaskRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            if find_task_row(connection, task_id)?.is_none() {
                return Err(TaskRepositoryError::NotFound(task_id));
            }
            let removed = diesel::delete(
                task_blockers::table.find((id_text(task_id), id_text(blocker_id))),
            )
            .execute(connection)
            .map_err(TaskRepositoryError::persistence)?;
            Ok(removed > 0)
        })
        .await
    }

    async fn delete_cascade(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskId>> {
        self.run_blocking(move |connection| {
            connection.immediate_transaction(|tx| {
                if find_task_row(tx, id)?.is_none() {
                    return Err(TaskRepositoryError::NotFound(id));
                }
                let mut removed = vec![id];
                removed.extend(load_descendants(tx, id)?.iter().map(Task::id));
                let keys: Vec<String> = removed.iter().copied().map(id_text).collect();

                diesel::delete(
                    task_blockers::table.filter(
                        task_blockers::task_id
                            .eq_any(&keys)
                            .or(task_blockers::blocker_id.eq_any(&keys)),
                    ),
                )
                .execute(tx)?;
                diesel::delete(learnings::table.filter(learnings::task_id.eq_any(&keys)))
                    .execute(tx)?;
                // Children first so the parent reference never dangles.
                for key in keys.iter().rev() {
                    diesel::delete(tasks::table.find(key)).execute(tx)?;
                }
                Ok(removed)
            })
        })
        .await
    }

    async fn set_bookmark(
        &self,
        id: TaskId,
        bookmark: &BookmarkName,
        start_commit: Option<&PositionRef>,
    ) -> TaskRepositoryResult<()> {
        let name = bookmark.as_str().to_owned();
        let position = start_commit.map(|commit| commit.as_str().to_owned());
        self.run_blocking(move |connection| {
            let target = tasks::table.find(id_text(id));
            let updated = match position {
                Some(commit) => diesel::update(target)
                    .set((tasks::bookmark.eq(name), tasks::start_commit.eq(commit)))
                    .execute(connection),
                None => diesel::update(target)
                    .set(tasks::bookmark.eq(name))
                    .execute(connection),
            }
            .map_err(TaskRepositoryError::persistence)?;
            if updated == 0 {
                return Err(TaskRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn clear_bookmark(&self, id: TaskId) -> TaskRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let updated = diesel::update(tasks::table.find(id_text(id)))
                .set(tasks::bookmark.eq(None::<String>))
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            if updated == 0 {
                return Err(TaskRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn attach_learning(&self, learning: &Learning) -> TaskRepositoryResult<()> {
        let holder = learning.task_id();
        let row = learning_to_row(learning);
        self.run_blocking(move |connection| {
            if find_task_row(connection, holder)?.is_none() {
                return Err(TaskRepositoryError::NotFound(holder));
            }
            diesel::insert_into(learnings::table)
                .values(&row)
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn list_learnings(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Learning>> {
        self.run_blocking(move |connection| {
            let rows = learnings::table
                .filter(learnings::task_id.eq(id_text(task_id)))
                .select(LearningRow::as_select())
                .load::<LearningRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            let mut found = rows
                .into_iter()
                .map(row_to_learning)
                .collect::<TaskRepositoryResult<Vec<_>>>()?;
            sort_learnings(&mut found);
            Ok(found)
        })
        .await
    }

    async fn find_learning(&self, id: LearningId) -> TaskRepositoryResult<Option<Learning>> {
        self.run_blocking(move |connection| {
            learnings::table
                .find(id.into_inner().to_string())
                .select(LearningRow::as_select())
                .first::<LearningRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?
                .map(row_to_learning)
                .transpose()
        })
        .await
    }

    async fn delete_learning(&self, id: LearningId) -> TaskRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let removed = diesel::delete(learnings::table.find(id.into_inner().to_string()))
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            if removed == 0 {
                return Err(TaskRepositoryError::LearningNotFound(id));
            }
            Ok(())
        })
        .await
    }
}

fn find_task_row(
    connection: &mut SqliteConnection,
    id: TaskId,
) -> TaskRepositoryResult<Option<TaskRow>> {
    tasks::table
        .find(id_text(id))
        .select(TaskRow::as_select())
        .first::<TaskRow>(connection)
        .optional()
        .map_err(TaskRepositoryError::persistence)
}

fn require_task(connection: &mut SqliteConnection, id: TaskId) -> TaskRepositoryResult<Task> {
    find_task_row(connection, id)?
        .map(row_to_task)
        .transpose()?
        .ok_or(TaskRepositoryError::NotFound(id))
}

/// Writes every column except the parent, which only `reparent` changes.
fn write_changes(connection: &mut SqliteConnection, task: &Task) -> TaskRepositoryResult<()> {
    let updated = diesel::update(tasks::table.find(id_text(task.id())))
        .set(&task_to_changes(task))
        .execute(connection)?;
    if updated == 0 {
        return Err(TaskRepositoryError::NotFound(task.id()));
    }
    Ok(())
}

fn load_children(
    connection: &mut SqliteConnection,
    parents: &[String],
) -> TaskRepositoryResult<Vec<Task>> {
    let rows = tasks::table
        .filter(tasks::parent_id.eq_any(parents))
        .select(TaskRow::as_select())
        .load::<TaskRow>(connection)
        .map_err(TaskRepositoryError::persistence)?;
    rows_to_tasks(rows)
}

/// Walks the subtree one level at a time.
fn load_descendants(connection: &mut SqliteConnection, id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
    let mut descendants = Vec::new();
    let mut frontier = vec![id_text(id)];
    while !frontier.is_empty() {
        let mut level = load_children(connection, &frontier)?;
        sort_for_listing(&mut level);
        frontier = level.iter().map(|task| id_text(task.id())).collect();
        descendants.extend(level);
    }
    Ok(descendants)
}

fn load_snapshot(connection: &mut SqliteConnection) -> TaskRepositoryResult<GraphSnapshot> {
    let rows = tasks::table
        .select(TaskRow::as_select())
        .load::<TaskRow>(connection)
        .map_err(TaskRepositoryError::persistence)?;
    let all = rows_to_tasks(rows)?;
    let edges = task_blockers::table
        .select(BlockerRow::as_select())
        .load::<BlockerRow>(connection)
        .map_err(TaskRepositoryError::persistence)?
        .iter()
        .map(|edge| Ok((parse_task_id(&edge.task_id)?, parse_task_id(&edge.blocker_id)?)))
        .collect::<TaskRepositoryResult<Vec<_>>>()?;
    Ok(GraphSnapshot::from_parts(all.iter(), edges))
}

fn id_text(id: TaskId) -> String {
    id.into_inner().to_string()
}

fn parse_uuid(raw: &str) -> TaskRepositoryResult<Uuid> {
    Uuid::parse_str(raw).map_err(TaskRepositoryError::persistence)
}

fn parse_task_id(raw: &str) -> TaskRepositoryResult<TaskId> {
    parse_uuid(raw).map(TaskId::from_uuid)
}

fn timestamp_text(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339()
}

fn parse_timestamp(raw: &str) -> TaskRepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(TaskRepositoryError::persistence)
}

fn parse_optional_timestamp(raw: Option<&str>) -> TaskRepositoryResult<Option<DateTime<Utc>>> {
    raw.map(parse_timestamp).transpose()
}

fn task_to_row(task: &Task) -> TaskRow {
    let lifecycle = task.lifecycle();
    TaskRow {
        id: id_text(task.id()),
        parent_id: task.parent_id().map(id_text),
        description: task.description().to_owned(),
        context: task.context().to_owned(),
        result: task.result().map(str::to_owned),
        priority: i32::from(task.priority().value()),
        started_at: lifecycle.started_at.map(timestamp_text),
        completed_at: lifecycle.completed_at.map(timestamp_text),
        cancelled_at: lifecycle.cancelled_at.map(timestamp_text),
        archived_at: lifecycle.archived_at.map(timestamp_text),
        bookmark: task.bookmark().map(|name| name.as_str().to_owned()),
        start_commit: task.start_commit().map(|commit| commit.as_str().to_owned()),
        commit_sha: task.commit_sha().map(|commit| commit.as_str().to_owned()),
        created_at: timestamp_text(task.created_at()),
        updated_at: timestamp_text(task.updated_at()),
    }
}

fn task_to_changes(task: &Task) -> TaskChanges {
    let row = task_to_row(task);
    TaskChanges {
        description: row.description,
        context: row.context,
        result: row.result,
        priority: row.priority,
        started_at: row.started_at,
        completed_at: row.completed_at,
        cancelled_at: row.cancelled_at,
        archived_at: row.archived_at,
        bookmark: row.bookmark,
        start_commit: row.start_commit,
        commit_sha: row.commit_sha,
        updated_at: row.updated_at,
    }
}

fn rows_to_tasks(rows: Vec<TaskRow>) -> TaskRepositoryResult<Vec<Task>> {
    rows.into_iter().map(row_to_task).collect()
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let lifecycle = LifecycleTimestamps {
        started_at: parse_optional_timestamp(row.started_at.as_deref())?,
        completed_at: parse_optional_timestamp(row.completed_at.as_deref())?,
        cancelled_at: parse_optional_timestamp(row.cancelled_at.as_deref())?,
        archived_at: parse_optional_timestamp(row.archived_at.as_deref())?,
    };
    let data = PersistedTaskData {
        id: parse_task_id(&row.id)?,
        parent_id: row.parent_id.as_deref().map(parse_task_id).transpose()?,
        description: row.description,
        context: row.context,
        result: row.result,
        priority: Priority::new(i64::from(row.priority))
            .map_err(TaskRepositoryError::persistence)?,
        lifecycle,
        bookmark: row
            .bookmark
            .map(BookmarkName::new)
            .transpose()
            .map_err(TaskRepositoryError::persistence)?,
        start_commit: row
            .start_commit
            .map(PositionRef::new)
            .transpose()
            .map_err(TaskRepositoryError::persistence)?,
        commit_sha: row
            .commit_sha
            .map(PositionRef::new)
            .transpose()
            .map_err(TaskRepositoryError::persistence)?,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    };
    Ok(Task::from_persisted(data))
}

fn learning_to_row(learning: &Learning) -> LearningRow {
    LearningRow {
        id: learning.id().into_inner().to_string(),
        task_id: id_text(learning.task_id()),
        content: learning.content().to_owned(),
        source_task_id: id_text(learning.source_task_id()),
        created_at: timestamp_text(learning.created_at()),
    }
}

fn row_to_learning(row: LearningRow) -> TaskRepositoryResult<Learning> {
    Ok(Learning::from_persisted(PersistedLearningData {
        id: LearningId::from_uuid(parse_uuid(&row.id)?),
        task_id: parse_task_id(&row.task_id)?,
        content: row.content,
        source_task_id: parse_task_id(&row.source_task_id)?,
        created_at: parse_timestamp(&row.created_at)?,
    }))
}
