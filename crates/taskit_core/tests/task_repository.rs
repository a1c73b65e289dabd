use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use taskit_core::db::open_db_in_memory;
use taskit_core::repo::task_mapper::{to_domain, to_record};
use taskit_core::{
    MappingError, RepoError, SqliteTaskRepository, Task, TaskPriority, TaskRepository,
    TaskService, TaskStore, TaskValidationError,
};

fn store() -> TaskStore {
    TaskStore::try_new(open_db_in_memory().unwrap()).unwrap()
}

fn created_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_milli_opt(8, 30, 15, 125)
        .unwrap()
}

fn full_task() -> Task {
    let mut task = Task::new(
        "Dentist",
        TaskPriority::Critical,
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        created_at(),
    );
    task.description = "Annual check-up".to_string();
    task.time = NaiveTime::from_hms_opt(16, 45, 0);
    task.location = Some("Clinic".to_string());
    task
}

#[test]
fn mapper_round_trips_domain_tasks() {
    let minimal = Task::new(
        "Water plants",
        TaskPriority::Low,
        NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        created_at(),
    );
    let mut completed = full_task();
    completed.id = 12;
    completed.is_completed = true;

    for task in [minimal, full_task(), completed] {
        assert_eq!(to_domain(&to_record(&task)).unwrap(), task);
    }
}

#[test]
fn repository_round_trips_through_sqlite() {
    let store = store();
    let repo = SqliteTaskRepository::new(&store);

    let task = full_task();
    let id = repo.insert_task(&task).unwrap();

    let loaded = repo.get_task_by_id(id).unwrap().unwrap();
    assert_eq!(loaded, Task { id, ..task });
}

#[test]
fn repository_rejects_blank_title_without_writing() {
    let store = store();
    let repo = SqliteTaskRepository::new(&store);

    let mut task = full_task();
    task.title = "  ".to_string();
    let err = repo.insert_task(&task).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TaskValidationError::EmptyTitle)
    ));
    assert!(store.all_ordered_by_date().unwrap().is_empty());
}

#[test]
fn update_keeps_created_at_verbatim() {
    let store = store();
    let service = TaskService::new(SqliteTaskRepository::new(&store));

    let id = service.add_task(&full_task()).unwrap();
    let mut task = service.get_task_by_id(id).unwrap().unwrap();
    let created = task.created_at;

    task.title = "Dentist (moved)".to_string();
    task.description = "Reschedule".to_string();
    task.priority = TaskPriority::Medium;
    task.location = None;
    service.update_task(&task).unwrap();

    let reloaded = service.get_task_by_id(id).unwrap().unwrap();
    assert_eq!(reloaded.created_at, created);
    assert_eq!(reloaded.title, "Dentist (moved)");
    assert_eq!(reloaded.location, None);
}

#[test]
fn get_by_missing_id_is_none() {
    let store = store();
    let repo = SqliteTaskRepository::new(&store);
    assert_eq!(repo.get_task_by_id(404).unwrap(), None);
}

#[test]
fn malformed_stored_date_fails_reads() {
    let store = store();
    let repo = SqliteTaskRepository::new(&store);
    let id = repo.insert_task(&full_task()).unwrap();

    store
        .connection()
        .execute("UPDATE tasks SET date = '29/02/2024' WHERE id = ?1;", [id])
        .unwrap();

    let err = repo.get_task_by_id(id).unwrap_err();
    assert!(matches!(
        err,
        RepoError::MalformedRecord(MappingError::InvalidDate { .. })
    ));
}

#[test]
fn stream_surfaces_malformed_rows() {
    let store = store();
    let repo = SqliteTaskRepository::new(&store);
    let id = repo.insert_task(&full_task()).unwrap();
    store
        .connection()
        .execute("UPDATE tasks SET created_at = 'yesterday' WHERE id = ?1;", [id])
        .unwrap();
    // Any later mutation republishes the corrupt row.
    repo.insert_task(&full_task()).unwrap();

    let mut stream = repo.get_all_tasks();
    assert!(matches!(
        stream.current(),
        Err(RepoError::MalformedRecord(MappingError::InvalidCreatedAt { .. }))
    ));
}

#[test]
fn stream_emits_full_domain_snapshots() {
    let store = store();
    let service = TaskService::new(SqliteTaskRepository::new(&store));
    let mut stream = service.get_tasks();
    assert!(stream.current().unwrap().is_empty());
    assert!(!stream.has_changed());

    let id = service.add_task(&full_task()).unwrap();
    assert!(stream.has_changed());
    let snapshot = stream.current().unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, id);
    assert!(!stream.has_changed());

    service.delete_task(&snapshot[0]).unwrap();
    assert!(stream.current().unwrap().is_empty());
}
