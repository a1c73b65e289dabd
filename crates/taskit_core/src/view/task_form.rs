//! Create/edit form view-state.
//!
//! # Responsibility
//! - Buffer in-progress edits of one task with input-time truncation.
//! - Reject dates/times in the past unless an edited task keeps its schedule.
//! - Turn a valid buffer into exactly one insert (create) or update (edit).
//!
//! # Invariants
//! - The mode is fixed at construction.
//! - Edit mode preserves the loaded task's `id`, `created_at` and `is_completed`.
//! - Submit is a no-op while disabled; nothing reaches the store.

use crate::clock::Clock;
use crate::model::task::{
    normalize_location, truncate_chars, Task, TaskId, TaskPriority, DESCRIPTION_MAX_CHARS,
    LOCATION_MAX_CHARS, TITLE_MAX_CHARS, UNSAVED_TASK_ID,
};
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoResult;
use crate::service::task_service::TaskService;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(TaskId),
}

/// Inline schedule error shown under the date/time pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeError {
    /// Date-only task on a day before today.
    PastDate,
    /// Date and time resolve to an instant before now.
    PastDateTime,
}

impl DateTimeError {
    pub fn message(self) -> &'static str {
        match self {
            Self::PastDate => "You can't pick a date in the past",
            Self::PastDateTime => "You can't pick a date and time in the past",
        }
    }
}

/// Field buffer rendered by the form screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFormState {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub location: String,
    pub date_time_error: Option<DateTimeError>,
    pub is_submit_enabled: bool,
}

impl TaskFormState {
    fn blank(date: Option<NaiveDate>) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            priority: TaskPriority::Medium,
            date,
            time: None,
            location: String::new(),
            date_time_error: None,
            is_submit_enabled: false,
        }
    }

    pub fn title_len(&self) -> usize {
        self.title.chars().count()
    }

    pub fn description_len(&self) -> usize {
        self.description.chars().count()
    }

    pub fn location_len(&self) -> usize {
        self.location.chars().count()
    }
}

/// Checks a chosen schedule against `now`.
///
/// `original` is the loaded task's `(date, time)` in edit mode. When the
/// chosen schedule equals it the check is skipped, so an overdue task can be
/// edited without being rescheduled.
pub fn validate_date_time(
    date: NaiveDate,
    time: Option<NaiveTime>,
    original: Option<(NaiveDate, Option<NaiveTime>)>,
    now: NaiveDateTime,
) -> Option<DateTimeError> {
    if original == Some((date, time)) {
        return None;
    }
    match time {
        None if date < now.date() => Some(DateTimeError::PastDate),
        None => None,
        Some(time) if date.and_time(time) < now => Some(DateTimeError::PastDateTime),
        Some(_) => None,
    }
}

/// View-state behind the create/edit task screen.
pub struct TaskFormViewState<'svc, R: TaskRepository> {
    service: &'svc TaskService<R>,
    clock: &'svc dyn Clock,
    mode: FormMode,
    original: Option<Task>,
    state: TaskFormState,
    submitted: bool,
}

impl<'svc, R: TaskRepository> TaskFormViewState<'svc, R> {
    /// Empty form for a new task dated today.
    pub fn create(service: &'svc TaskService<R>, clock: &'svc dyn Clock) -> Self {
        Self {
            service,
            clock,
            mode: FormMode::Create,
            original: None,
            state: TaskFormState::blank(Some(clock.today())),
            submitted: false,
        }
    }

    /// Unseeded edit form for `id`. Call [`load`](Self::load) to fetch the task.
    pub fn edit(service: &'svc TaskService<R>, clock: &'svc dyn Clock, id: TaskId) -> Self {
        Self {
            service,
            clock,
            mode: FormMode::Edit(id),
            original: None,
            state: TaskFormState::blank(None),
            submitted: false,
        }
    }

    /// Edit form for `id`, loaded immediately.
    pub fn open_edit(
        service: &'svc TaskService<R>,
        clock: &'svc dyn Clock,
        id: TaskId,
    ) -> RepoResult<Self> {
        let mut form = Self::edit(service, clock, id);
        form.load()?;
        Ok(form)
    }

    /// Fetches and seeds the edited task.
    ///
    /// Returns `Ok(false)` when the task no longer exists; the form then stays
    /// unseeded and cannot submit. Create forms and already seeded forms
    /// return `Ok(true)` without touching the store.
    pub fn load(&mut self) -> RepoResult<bool> {
        let FormMode::Edit(id) = self.mode else {
            return Ok(true);
        };
        if self.original.is_some() {
            return Ok(true);
        }

        let Some(task) = self.service.get_task_by_id(id)? else {
            info!("event=task_form_load module=view status=not_found id={id}");
            return Ok(false);
        };

        self.state = TaskFormState {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            date: Some(task.date),
            time: task.time,
            location: task.location.clone().unwrap_or_default(),
            date_time_error: None,
            is_submit_enabled: false,
        };
        self.original = Some(task);
        self.revalidate_schedule();
        info!("event=task_form_load module=view status=ok id={id}");
        Ok(true)
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn state(&self) -> &TaskFormState {
        &self.state
    }

    /// The task as loaded in edit mode.
    pub fn original(&self) -> Option<&Task> {
        self.original.as_ref()
    }

    pub fn is_seeded(&self) -> bool {
        match self.mode {
            FormMode::Create => true,
            FormMode::Edit(_) => self.original.is_some(),
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn set_title(&mut self, value: &str) {
        self.state.title = truncate_chars(value, TITLE_MAX_CHARS);
        self.refresh_submit();
    }

    pub fn set_description(&mut self, value: &str) {
        self.state.description = truncate_chars(value, DESCRIPTION_MAX_CHARS);
        self.refresh_submit();
    }

    pub fn set_location(&mut self, value: &str) {
        self.state.location = truncate_chars(value, LOCATION_MAX_CHARS);
        self.refresh_submit();
    }

    pub fn set_priority(&mut self, priority: TaskPriority) {
        self.state.priority = priority;
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.state.date = Some(date);
        self.revalidate_schedule();
    }

    /// `None` turns the task into a date-only task.
    pub fn set_time(&mut self, time: Option<NaiveTime>) {
        self.state.time = time;
        self.revalidate_schedule();
    }

    /// Writes the buffer to the store.
    ///
    /// Returns the saved task, or `None` when submit is disabled or the
    /// schedule has slipped into the past since it was picked.
    ///
    /// # Errors
    /// Store failures are returned unchanged; the form stays editable.
    pub fn submit(&mut self) -> RepoResult<Option<Task>> {
        if !self.state.is_submit_enabled {
            return Ok(None);
        }
        let Some(date) = self.state.date else {
            return Ok(None);
        };

        // The check is relative to submission time, not to when the date was picked.
        self.revalidate_schedule();
        if !self.state.is_submit_enabled {
            return Ok(None);
        }

        let mut task = Task {
            id: self.original.as_ref().map_or(UNSAVED_TASK_ID, |task| task.id),
            title: self.state.title.trim().to_string(),
            description: self.state.description.trim().to_string(),
            priority: self.state.priority,
            date,
            time: self.state.time,
            location: normalize_location(&self.state.location),
            is_completed: self
                .original
                .as_ref()
                .is_some_and(|original| original.is_completed),
            created_at: self
                .original
                .as_ref()
                .map_or_else(|| self.clock.now(), |original| original.created_at),
        };

        match self.mode {
            FormMode::Create => {
                task.id = self.service.add_task(&task)?;
            }
            FormMode::Edit(_) => {
                self.service.update_task(&task)?;
            }
        }

        self.submitted = true;
        self.state.is_submit_enabled = false;
        info!(
            "event=task_form_submit module=view status=ok mode={} id={}",
            match self.mode {
                FormMode::Create => "create",
                FormMode::Edit(_) => "edit",
            },
            task.id
        );
        Ok(Some(task))
    }

    fn original_schedule(&self) -> Option<(NaiveDate, Option<NaiveTime>)> {
        self.original.as_ref().map(|task| (task.date, task.time))
    }

    fn revalidate_schedule(&mut self) {
        self.state.date_time_error = self.state.date.and_then(|date| {
            validate_date_time(
                date,
                self.state.time,
                self.original_schedule(),
                self.clock.now(),
            )
        });
        self.refresh_submit();
    }

    fn refresh_submit(&mut self) {
        self.state.is_submit_enabled = !self.submitted
            && self.is_seeded()
            && !self.state.title.trim().is_empty()
            && self.state.date_time_error.is_none()
            && self.state.date.is_some();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn today_without_time_is_allowed() {
        let now = at(2024, 5, 10, 18, 0);
        assert_eq!(validate_date_time(now.date(), None, None, now), None);
    }

    #[test]
    fn yesterday_without_time_is_past_date() {
        let now = at(2024, 5, 10, 18, 0);
        let yesterday = now.date().pred_opt().unwrap();
        assert_eq!(
            validate_date_time(yesterday, None, None, now),
            Some(DateTimeError::PastDate)
        );
    }

    #[test]
    fn earlier_time_today_is_past_date_time() {
        let now = at(2024, 5, 10, 18, 0);
        let time = NaiveTime::from_hms_opt(9, 0, 0);
        assert_eq!(
            validate_date_time(now.date(), time, None, now),
            Some(DateTimeError::PastDateTime)
        );
        assert!(DateTimeError::PastDateTime.message().contains("time"));
    }

    #[test]
    fn unchanged_original_schedule_is_exempt() {
        let now = at(2024, 5, 10, 18, 0);
        let past = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let time = NaiveTime::from_hms_opt(9, 0, 0);
        assert_eq!(
            validate_date_time(past, time, Some((past, time)), now),
            None
        );
        assert_eq!(
            validate_date_time(past, None, Some((past, time)), now),
            Some(DateTimeError::PastDate)
        );
    }
}
