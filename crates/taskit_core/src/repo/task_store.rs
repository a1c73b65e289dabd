//! SQLite task store with a live "all tasks" snapshot.
//!
//! # Responsibility
//! - Own the database connection for the process lifetime.
//! - Provide single-statement CRUD over the `tasks` table.
//! - Publish the full date-ordered collection after every mutation.
//!
//! # Invariants
//! - Subscribers only ever see whole snapshots taken after a committed write.
//! - A mutation's result reflects the write alone; a failed snapshot re-read
//!   is logged and never reported as a failed write.
//! - Ids come from `AUTOINCREMENT` and are never reused.
//! - Delete is idempotent; update of a missing id is `NotFound`.

use crate::db::{DbError, DbResult};
use crate::model::task::{TaskId, UNSAVED_TASK_ID};
use crate::repo::task_mapper::{MappingError, TaskRecord};
use crate::repo::{RepoError, RepoResult};
use log::{debug, error, info};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::watch;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    priority,
    date,
    time,
    location,
    is_completed,
    created_at
FROM tasks";

const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "title",
    "description",
    "priority",
    "date",
    "time",
    "location",
    "is_completed",
    "created_at",
];

/// Full date-ordered collection, or the first row that could not be read.
pub type TaskSnapshot = Result<Vec<TaskRecord>, MappingError>;

/// Durable task storage plus the live snapshot channel.
pub struct TaskStore {
    conn: Connection,
    snapshots: watch::Sender<TaskSnapshot>,
}

impl TaskStore {
    /// Wraps a migrated connection and loads the initial snapshot.
    ///
    /// # Errors
    /// - `RepoError::UninitializedConnection` when migrations have not run.
    /// - `RepoError::MissingRequiredColumn` when `tasks` lacks a column.
    /// - `RepoError::Storage` when the initial snapshot cannot be queried.
    ///
    /// Malformed rows do not fail construction; they are carried in the
    /// snapshot for subscribers to report.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_schema(&conn)?;
        let initial = match query_all_ordered_by_date(&conn) {
            Ok(records) => Ok(records),
            Err(RepoError::MalformedRecord(err)) => Err(err),
            Err(err) => return Err(err),
        };
        let (snapshots, _) = watch::channel(initial);
        Ok(Self { conn, snapshots })
    }

    /// Connection shared with sibling stores (preferences).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Inserts `record` and returns its id.
    ///
    /// A record with `id == 0` gets a fresh id. A non-zero id is written as
    /// given and replaces any existing row with that id.
    pub fn insert(&self, record: &TaskRecord) -> RepoResult<TaskId> {
        let result = if record.id == UNSAVED_TASK_ID {
            self.conn
                .execute(
                    "INSERT INTO tasks (
                        title, description, priority, date, time, location, is_completed, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                    params![
                        record.title,
                        record.description,
                        record.priority,
                        record.date,
                        record.time,
                        record.location,
                        record.is_completed,
                        record.created_at,
                    ],
                )
                .map(|_| self.conn.last_insert_rowid())
        } else {
            self.conn
                .execute(
                    "INSERT OR REPLACE INTO tasks (
                        id, title, description, priority, date, time, location, is_completed, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                    params![
                        record.id,
                        record.title,
                        record.description,
                        record.priority,
                        record.date,
                        record.time,
                        record.location,
                        record.is_completed,
                        record.created_at,
                    ],
                )
                .map(|_| record.id)
        };

        let id = result.map_err(|err| {
            error!("event=task_insert module=repo status=error error={err}");
            RepoError::from(err)
        })?;
        info!("event=task_insert module=repo status=ok id={id}");
        self.publish();
        Ok(id)
    }

    /// Replaces the row with `record.id`.
    pub fn update(&self, record: &TaskRecord) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE tasks
                 SET
                    title = ?1,
                    description = ?2,
                    priority = ?3,
                    date = ?4,
                    time = ?5,
                    location = ?6,
                    is_completed = ?7,
                    created_at = ?8
                 WHERE id = ?9;",
                params![
                    record.title,
                    record.description,
                    record.priority,
                    record.date,
                    record.time,
                    record.location,
                    record.is_completed,
                    record.created_at,
                    record.id,
                ],
            )
            .map_err(|err| {
                error!(
                    "event=task_update module=repo status=error id={} error={err}",
                    record.id
                );
                RepoError::from(err)
            })?;

        if changed == 0 {
            info!(
                "event=task_update module=repo status=not_found id={}",
                record.id
            );
            return Err(RepoError::NotFound(record.id));
        }

        info!("event=task_update module=repo status=ok id={}", record.id);
        self.publish();
        Ok(())
    }

    /// Removes the row with `id`. Missing ids are not an error.
    pub fn delete(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id])
            .map_err(|err| {
                error!("event=task_delete module=repo status=error id={id} error={err}");
                RepoError::from(err)
            })?;

        info!("event=task_delete module=repo status=ok id={id} removed={changed}");
        if changed > 0 {
            self.publish();
        }
        Ok(())
    }

    /// Point lookup by id.
    pub fn get_by_id(&self, id: TaskId) -> RepoResult<Option<TaskRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("{TASK_SELECT_SQL} WHERE id = ?1 LIMIT 1;"),
                [id],
                parse_task_row,
            )
            .optional()?;
        match record {
            Some(record) => Ok(Some(record?)),
            None => Ok(None),
        }
    }

    /// Live view of every task ordered by `date` ascending (ties by id).
    ///
    /// The receiver starts at the current snapshot and is marked changed after
    /// every later mutation.
    pub fn subscribe_all_ordered_by_date(&self) -> watch::Receiver<TaskSnapshot> {
        self.snapshots.subscribe()
    }

    /// One-shot read of the ordered collection.
    pub fn all_ordered_by_date(&self) -> RepoResult<Vec<TaskRecord>> {
        query_all_ordered_by_date(&self.conn)
    }

    /// Closes the connection. Live subscribers observe the channel closing.
    pub fn close(self) -> DbResult<()> {
        let Self { conn, snapshots } = self;
        drop(snapshots);
        conn.close().map_err(|(_, err)| DbError::Sqlite(err))
    }

    // Runs after the write has committed, so failures here are only logged.
    // Malformed rows are forwarded to subscribers; a failed query keeps the
    // previous snapshot.
    fn publish(&self) {
        let snapshot = match query_all_ordered_by_date(&self.conn) {
            Ok(records) => {
                debug!(
                    "event=task_snapshot module=repo status=ok count={} subscribers={}",
                    records.len(),
                    self.snapshots.receiver_count()
                );
                Ok(records)
            }
            Err(RepoError::MalformedRecord(err)) => {
                error!("event=task_snapshot module=repo status=malformed error={err}");
                Err(err)
            }
            Err(err) => {
                error!("event=task_snapshot module=repo status=error error={err}");
                return;
            }
        };
        self.snapshots.send_replace(snapshot);
    }
}

fn query_all_ordered_by_date(conn: &Connection) -> RepoResult<Vec<TaskRecord>> {
    let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} ORDER BY date ASC, id ASC;"))?;
    let rows = stmt.query_map([], parse_task_row)?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row??);
    }
    Ok(records)
}

// Text columns holding another storage class are malformed rows, not
// transport failures.
fn parse_task_row(row: &Row<'_>) -> rusqlite::Result<Result<TaskRecord, MappingError>> {
    let id: TaskId = row.get("id")?;

    let priority = match text_column(row, "priority")? {
        Ok(Some(value)) => value,
        Ok(None) => return Ok(Err(MappingError::InvalidPriority { id, value: null() })),
        Err(value) => return Ok(Err(MappingError::InvalidPriority { id, value })),
    };
    let date = match text_column(row, "date")? {
        Ok(Some(value)) => value,
        Ok(None) => return Ok(Err(MappingError::InvalidDate { id, value: null() })),
        Err(value) => return Ok(Err(MappingError::InvalidDate { id, value })),
    };
    let time = match text_column(row, "time")? {
        Ok(value) => value,
        Err(value) => return Ok(Err(MappingError::InvalidTime { id, value })),
    };
    let created_at = match text_column(row, "created_at")? {
        Ok(Some(value)) => value,
        Ok(None) => return Ok(Err(MappingError::InvalidCreatedAt { id, value: null() })),
        Err(value) => return Ok(Err(MappingError::InvalidCreatedAt { id, value })),
    };

    Ok(Ok(TaskRecord {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        priority,
        date,
        time,
        location: row.get("location")?,
        is_completed: row.get("is_completed")?,
        created_at,
    }))
}

/// `Ok(None)` for NULL, `Err` naming the storage class of any non-text value.
fn text_column(row: &Row<'_>, name: &str) -> rusqlite::Result<Result<Option<String>, String>> {
    Ok(match row.get::<_, Value>(name)? {
        Value::Text(text) => Ok(Some(text)),
        Value::Null => Ok(None),
        other => Err(format!("<{}>", other.data_type())),
    })
}

fn null() -> String {
    "<Null>".to_string()
}

fn ensure_schema(conn: &Connection) -> RepoResult<()> {
    let expected = crate::db::migrations::latest_version();
    let actual: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual < expected {
        return Err(RepoError::UninitializedConnection {
            expected_version: expected,
            actual_version: actual,
        });
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('tasks');")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    if columns.is_empty() {
        return Err(RepoError::MissingRequiredTable("tasks"));
    }
    for &column in REQUIRED_COLUMNS {
        if !columns.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: "tasks",
                column,
            });
        }
    }
    Ok(())
}
