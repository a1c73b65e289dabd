//! Domain-typed task repository over [`TaskStore`].
//!
//! # Responsibility
//! - Validate and encode tasks on the way in, decode rows on the way out.
//! - Hand view-states a live stream of domain tasks, never raw rows.

use crate::model::task::{Task, TaskId};
use crate::repo::task_mapper::{to_domain, to_record, TaskRecord};
use crate::repo::task_store::{TaskSnapshot, TaskStore};
use crate::repo::{RepoError, RepoResult};
use tokio::sync::watch;

/// Repository contract consumed by the task service.
pub trait TaskRepository {
    fn insert_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn delete_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task_by_id(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn get_all_tasks(&self) -> TaskStream;
}

/// Live sequence of the full task collection, ordered by date.
///
/// Each item is a complete snapshot; there are no incremental diffs.
pub struct TaskStream {
    rx: watch::Receiver<TaskSnapshot>,
}

impl TaskStream {
    pub(crate) fn new(rx: watch::Receiver<TaskSnapshot>) -> Self {
        Self { rx }
    }

    /// Decodes the latest snapshot and marks it as seen.
    pub fn current(&mut self) -> RepoResult<Vec<Task>> {
        match &*self.rx.borrow_and_update() {
            Ok(records) => decode_all(records),
            Err(err) => Err(RepoError::MalformedRecord(err.clone())),
        }
    }

    /// Returns whether a snapshot newer than the last one read is waiting.
    /// A closed store reports `false`.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Waits for the next snapshot. Returns `None` once the store is closed.
    pub async fn changed(&mut self) -> Option<RepoResult<Vec<Task>>> {
        self.rx.changed().await.ok()?;
        Some(self.current())
    }
}

/// [`TaskRepository`] backed by the process-wide [`TaskStore`].
pub struct SqliteTaskRepository<'store> {
    store: &'store TaskStore,
}

impl<'store> SqliteTaskRepository<'store> {
    pub fn new(store: &'store TaskStore) -> Self {
        Self { store }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn insert_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;
        self.store.insert(&to_record(task))
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;
        self.store.update(&to_record(task))
    }

    fn delete_task(&self, task: &Task) -> RepoResult<()> {
        self.store.delete(task.id)
    }

    fn get_task_by_id(&self, id: TaskId) -> RepoResult<Option<Task>> {
        match self.store.get_by_id(id)? {
            Some(record) => Ok(Some(to_domain(&record)?)),
            None => Ok(None),
        }
    }

    fn get_all_tasks(&self) -> TaskStream {
        TaskStream::new(self.store.subscribe_all_ordered_by_date())
    }
}

fn decode_all(records: &[TaskRecord]) -> RepoResult<Vec<Task>> {
    records
        .iter()
        .map(|record| to_domain(record).map_err(RepoError::from))
        .collect()
}
