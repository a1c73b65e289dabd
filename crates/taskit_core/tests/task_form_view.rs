use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::cell::Cell;
use taskit_core::db::open_db_in_memory;
use taskit_core::model::task::TITLE_MAX_CHARS;
use taskit_core::{
    Clock, DateTimeError, FixedClock, FormMode, SqliteTaskRepository, Task, TaskFormViewState,
    TaskPriority, TaskService, TaskStore,
};

fn store() -> TaskStore {
    TaskStore::try_new(open_db_in_memory().unwrap()).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn now() -> NaiveDateTime {
    date(2024, 5, 10).and_hms_opt(12, 0, 0).unwrap()
}

fn seed_past_task(service: &TaskService<SqliteTaskRepository<'_>>) -> Task {
    let mut task = Task::new(
        "Old errand",
        TaskPriority::Low,
        date(2020, 1, 1),
        date(2019, 12, 1).and_hms_opt(9, 0, 0).unwrap(),
    );
    task.is_completed = true;
    task.location = Some("Market".to_string());
    task.id = service.add_task(&task).unwrap();
    task
}

#[test]
fn create_form_starts_with_defaults() {
    let store = store();
    let service = TaskService::new(SqliteTaskRepository::new(&store));
    let clock = FixedClock(now());

    let form = TaskFormViewState::create(&service, &clock);
    let state = form.state();

    assert_eq!(form.mode(), FormMode::Create);
    assert_eq!(state.priority, TaskPriority::Medium);
    assert_eq!(state.date, Some(date(2024, 5, 10)));
    assert_eq!(state.time, None);
    assert_eq!(state.location, "");
    assert!(!state.is_submit_enabled);
}

#[test]
fn blank_title_keeps_submit_disabled_and_writes_nothing() {
    let store = store();
    let service = TaskService::new(SqliteTaskRepository::new(&store));
    let clock = FixedClock(now());

    let mut form = TaskFormViewState::create(&service, &clock);
    form.set_title("    ");
    assert!(!form.state().is_submit_enabled);

    assert_eq!(form.submit().unwrap(), None);
    assert!(store.all_ordered_by_date().unwrap().is_empty());
}

#[test]
fn setters_truncate_to_field_limits() {
    let store = store();
    let service = TaskService::new(SqliteTaskRepository::new(&store));
    let clock = FixedClock(now());

    let mut form = TaskFormViewState::create(&service, &clock);
    form.set_title(&"x".repeat(TITLE_MAX_CHARS + 10));
    form.set_location(&"é".repeat(500));

    assert_eq!(form.state().title_len(), TITLE_MAX_CHARS);
    assert_eq!(form.state().location_len(), 100);
}

#[test]
fn create_submit_inserts_a_trimmed_task_once() {
    let store = store();
    let service = TaskService::new(SqliteTaskRepository::new(&store));
    let clock = FixedClock(now());

    let mut form = TaskFormViewState::create(&service, &clock);
    form.set_title("  Buy milk  ");
    form.set_description(" two litres ");
    form.set_location("   ");
    form.set_priority(TaskPriority::High);
    form.set_date(date(2024, 5, 11));
    form.set_time(NaiveTime::from_hms_opt(8, 0, 0));
    assert!(form.state().is_submit_enabled);

    let saved = form.submit().unwrap().unwrap();
    assert!(saved.id > 0);
    assert_eq!(saved.title, "Buy milk");
    assert_eq!(saved.description, "two litres");
    assert_eq!(saved.location, None);
    assert_eq!(saved.priority, TaskPriority::High);
    assert!(!saved.is_completed);
    assert_eq!(saved.created_at, now());

    assert_eq!(service.get_task_by_id(saved.id).unwrap(), Some(saved));
    assert!(form.is_submitted());
    assert_eq!(form.submit().unwrap(), None);
    assert_eq!(store.all_ordered_by_date().unwrap().len(), 1);
}

#[test]
fn past_date_in_create_mode_disables_submit() {
    let store = store();
    let service = TaskService::new(SqliteTaskRepository::new(&store));
    let clock = FixedClock(now());

    let mut form = TaskFormViewState::create(&service, &clock);
    form.set_title("Too late");
    form.set_date(date(2024, 5, 9));
    assert_eq!(form.state().date_time_error, Some(DateTimeError::PastDate));
    assert!(!form.state().is_submit_enabled);

    form.set_date(date(2024, 5, 10));
    form.set_time(NaiveTime::from_hms_opt(11, 59, 0));
    assert_eq!(
        form.state().date_time_error,
        Some(DateTimeError::PastDateTime)
    );

    form.set_time(None);
    assert_eq!(form.state().date_time_error, None);
    assert!(form.state().is_submit_enabled);
}

#[test]
fn edit_of_past_task_is_allowed_until_the_schedule_changes() {
    let store = store();
    let service = TaskService::new(SqliteTaskRepository::new(&store));
    let clock = FixedClock(now());
    let seeded = seed_past_task(&service);

    let mut form = TaskFormViewState::open_edit(&service, &clock, seeded.id).unwrap();
    assert_eq!(form.mode(), FormMode::Edit(seeded.id));
    assert_eq!(form.state().date, Some(date(2020, 1, 1)));
    assert_eq!(form.state().location, "Market");
    assert_eq!(form.state().date_time_error, None);
    assert!(form.state().is_submit_enabled);

    form.set_date(date(2021, 6, 1));
    assert_eq!(form.state().date_time_error, Some(DateTimeError::PastDate));
    assert!(!form.state().is_submit_enabled);

    form.set_date(date(2020, 1, 1));
    assert_eq!(form.state().date_time_error, None);
    assert!(form.state().is_submit_enabled);
}

#[test]
fn edit_submit_preserves_identity_and_completion() {
    let store = store();
    let service = TaskService::new(SqliteTaskRepository::new(&store));
    let clock = FixedClock(now());
    let seeded = seed_past_task(&service);

    let mut form = TaskFormViewState::open_edit(&service, &clock, seeded.id).unwrap();
    form.set_title("Old errand, renamed");
    form.set_priority(TaskPriority::Critical);
    let saved = form.submit().unwrap().unwrap();

    assert_eq!(saved.id, seeded.id);
    assert_eq!(saved.created_at, seeded.created_at);
    assert!(saved.is_completed);
    assert_eq!(saved.date, seeded.date);

    let stored = service.get_task_by_id(seeded.id).unwrap().unwrap();
    assert_eq!(stored, saved);
    assert_eq!(store.all_ordered_by_date().unwrap().len(), 1);
}

#[test]
fn edit_of_missing_task_stays_unseeded() {
    let store = store();
    let service = TaskService::new(SqliteTaskRepository::new(&store));
    let clock = FixedClock(now());

    let mut form = TaskFormViewState::edit(&service, &clock, 77);
    assert!(!form.load().unwrap());
    assert!(!form.is_seeded());

    form.set_title("Typed anyway");
    form.set_date(date(2030, 1, 1));
    assert!(!form.state().is_submit_enabled);
    assert_eq!(form.submit().unwrap(), None);
    assert!(store.all_ordered_by_date().unwrap().is_empty());
}

#[test]
fn submit_rechecks_the_schedule_against_submission_time() {
    let store = store();
    let service = TaskService::new(SqliteTaskRepository::new(&store));
    let clock = ManualClock(Cell::new(now()));

    let mut form = TaskFormViewState::create(&service, &clock);
    form.set_title("Call back");
    form.set_time(NaiveTime::from_hms_opt(12, 30, 0));
    assert!(form.state().is_submit_enabled);

    clock.0.set(date(2024, 5, 10).and_hms_opt(13, 0, 0).unwrap());

    assert_eq!(form.submit().unwrap(), None);
    assert_eq!(
        form.state().date_time_error,
        Some(DateTimeError::PastDateTime)
    );
    assert!(!form.state().is_submit_enabled);
    assert!(store.all_ordered_by_date().unwrap().is_empty());
}

struct ManualClock(Cell<NaiveDateTime>);

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.0.get()
    }
}

#[test]
fn submit_latches_even_when_another_row_is_corrupt() {
    let store = store();
    store
        .connection()
        .execute(
            "INSERT INTO tasks (title, priority, date, created_at)
             VALUES ('corrupt', 'LOW', X'00', '2024-01-01T08:00:00');",
            [],
        )
        .unwrap();
    let service = TaskService::new(SqliteTaskRepository::new(&store));
    let clock = FixedClock(now());

    let mut form = TaskFormViewState::create(&service, &clock);
    form.set_title("Pay rent");
    let saved = form.submit().unwrap().unwrap();

    assert!(form.is_submitted());
    assert_eq!(form.submit().unwrap(), None);
    let count: i64 = store
        .connection()
        .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 2);
    assert_eq!(service.get_task_by_id(saved.id).unwrap(), Some(saved));
}
