//! Task use cases: add, update, delete, get-by-id and get-all.
//!
//! # Invariants
//! - Every call delegates to exactly one repository operation.
//! - The service adds no rules of its own; validation lives in the model
//!   and the form view-state.

use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::{TaskRepository, TaskStream};
use crate::repo::RepoResult;

/// Use-case facade over a task repository.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists a new task and returns the store-assigned id.
    pub fn add_task(&self, task: &Task) -> RepoResult<TaskId> {
        self.repo.insert_task(task)
    }

    /// Replaces the stored task with the same id.
    pub fn update_task(&self, task: &Task) -> RepoResult<()> {
        self.repo.update_task(task)
    }

    /// Deletes by the task's id. Already-deleted tasks are not an error.
    pub fn delete_task(&self, task: &Task) -> RepoResult<()> {
        self.repo.delete_task(task)
    }

    pub fn get_task_by_id(&self, id: TaskId) -> RepoResult<Option<Task>> {
        self.repo.get_task_by_id(id)
    }

    /// Subscribes to the live, date-ordered task collection.
    pub fn get_tasks(&self) -> TaskStream {
        self.repo.get_all_tasks()
    }
}
