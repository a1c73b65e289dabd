//! Task list view-state.
//!
//! # Responsibility
//! - Hold the latest store snapshot and the priority filter chosen on screen.
//! - Derive the pending/completed projection shown by the list.
//! - Forward toggle-complete and delete intents to the task service.
//!
//! # Invariants
//! - The projection is a pure function of `(snapshot, filter)`; intents never
//!   patch it locally and only show up once the store re-emits.
//! - Within each group tasks keep `date` ascending order.

use crate::model::task::{Task, TaskPriority};
use crate::repo::task_repo::{TaskRepository, TaskStream};
use crate::repo::RepoResult;
use crate::service::task_service::TaskService;
use log::debug;

/// Tasks grouped for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListProjection {
    pub pending: Vec<Task>,
    pub completed: Vec<Task>,
}

impl TaskListProjection {
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.completed.is_empty()
    }

    /// Pending tasks followed by completed tasks.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.pending.iter().chain(self.completed.iter())
    }
}

/// Why the list has nothing to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEmptyState {
    /// The store holds no tasks at all.
    NoTasks,
    /// Tasks exist but none match the selected priority.
    NoMatches,
}

/// Keeps every task when `priority` is `None`, otherwise only exact matches.
pub fn filter_by_priority(tasks: &[Task], priority: Option<TaskPriority>) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| priority.map_or(true, |wanted| task.priority == wanted))
        .cloned()
        .collect()
}

/// Incomplete first, then by date. Stable, so store order breaks ties.
pub fn sort_for_display(tasks: &mut [Task]) {
    tasks.sort_by_key(|task| (task.is_completed, task.date));
}

/// Splits sorted tasks into pending and completed, keeping relative order.
pub fn group_by_completion(tasks: Vec<Task>) -> TaskListProjection {
    let (completed, pending): (Vec<Task>, Vec<Task>) =
        tasks.into_iter().partition(|task| task.is_completed);
    TaskListProjection { pending, completed }
}

/// Filter, sort, then group.
pub fn project(tasks: &[Task], priority: Option<TaskPriority>) -> TaskListProjection {
    let mut visible = filter_by_priority(tasks, priority);
    sort_for_display(&mut visible);
    group_by_completion(visible)
}

/// View-state behind the task list screen.
pub struct TaskListViewState<'svc, R: TaskRepository> {
    service: &'svc TaskService<R>,
    stream: TaskStream,
    tasks: Vec<Task>,
    selected_priority: Option<TaskPriority>,
    projection: TaskListProjection,
}

impl<'svc, R: TaskRepository> TaskListViewState<'svc, R> {
    /// Subscribes to the live collection and projects the current snapshot.
    ///
    /// # Errors
    /// - `RepoError::MalformedRecord` when a stored row cannot be decoded.
    pub fn new(service: &'svc TaskService<R>) -> RepoResult<Self> {
        let mut stream = service.get_tasks();
        let tasks = stream.current()?;
        let projection = project(&tasks, None);
        Ok(Self {
            service,
            stream,
            tasks,
            selected_priority: None,
            projection,
        })
    }

    /// Raw snapshot, in store order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn selected_priority(&self) -> Option<TaskPriority> {
        self.selected_priority
    }

    pub fn projection(&self) -> &TaskListProjection {
        &self.projection
    }

    pub fn empty_state(&self) -> Option<ListEmptyState> {
        if self.tasks.is_empty() {
            Some(ListEmptyState::NoTasks)
        } else if self.projection.is_empty() {
            Some(ListEmptyState::NoMatches)
        } else {
            None
        }
    }

    /// Sets or clears (`None`) the priority filter.
    pub fn set_priority_filter(&mut self, priority: Option<TaskPriority>) {
        self.selected_priority = priority;
        self.reproject();
    }

    /// Applies a pending snapshot without waiting. Returns whether one was applied.
    pub fn refresh(&mut self) -> RepoResult<bool> {
        if !self.stream.has_changed() {
            return Ok(false);
        }
        let tasks = self.stream.current()?;
        self.apply(tasks);
        Ok(true)
    }

    /// Waits for the next snapshot and applies it. Returns `false` once the
    /// store has shut down.
    pub async fn next_snapshot(&mut self) -> RepoResult<bool> {
        match self.stream.changed().await {
            Some(tasks) => {
                self.apply(tasks?);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Flips completion and writes the task back; every other field is kept.
    pub fn toggle_completed(&self, task: &Task) -> RepoResult<()> {
        self.service.update_task(&task.with_completed_toggled())
    }

    pub fn delete(&self, task: &Task) -> RepoResult<()> {
        self.service.delete_task(task)
    }

    fn apply(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.reproject();
    }

    fn reproject(&mut self) {
        self.projection = project(&self.tasks, self.selected_priority);
        debug!(
            "event=task_list_project module=view status=ok total={} pending={} completed={}",
            self.tasks.len(),
            self.projection.pending.len(),
            self.projection.completed.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task(id: i64, priority: TaskPriority, day: u32, done: bool) -> Task {
        let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let mut task = Task::new(
            format!("task {id}"),
            priority,
            date,
            date.and_hms_opt(8, 0, 0).unwrap(),
        );
        task.id = id;
        task.is_completed = done;
        task
    }

    fn ids(tasks: &[Task]) -> Vec<i64> {
        tasks.iter().map(|task| task.id).collect()
    }

    #[test]
    fn high_filter_keeps_only_high_tasks_in_date_order() {
        let tasks = vec![
            task(1, TaskPriority::Low, 1, false),
            task(2, TaskPriority::High, 2, false),
            task(3, TaskPriority::High, 3, false),
            task(4, TaskPriority::Critical, 4, false),
        ];

        let projection = project(&tasks, Some(TaskPriority::High));
        assert_eq!(ids(&projection.pending), vec![2, 3]);
        assert!(projection.completed.is_empty());
    }

    #[test]
    fn no_filter_keeps_everything() {
        let tasks = vec![
            task(1, TaskPriority::Low, 1, false),
            task(2, TaskPriority::Critical, 2, true),
        ];
        assert_eq!(filter_by_priority(&tasks, None).len(), 2);
    }

    #[test]
    fn grouping_puts_pending_first_sorted_by_date() {
        let tasks = vec![
            task(1, TaskPriority::Medium, 2, false),
            task(2, TaskPriority::Medium, 1, true),
            task(3, TaskPriority::Medium, 1, false),
        ];

        let projection = project(&tasks, None);
        assert_eq!(ids(&projection.pending), vec![3, 1]);
        assert_eq!(ids(&projection.completed), vec![2]);
        assert_eq!(
            projection.iter().map(|task| task.id).collect::<Vec<_>>(),
            vec![3, 1, 2]
        );
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut tasks = vec![
            task(5, TaskPriority::Low, 1, false),
            task(2, TaskPriority::Low, 1, false),
        ];
        sort_for_display(&mut tasks);
        assert_eq!(ids(&tasks), vec![5, 2]);
    }
}
