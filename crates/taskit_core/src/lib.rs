//! Core of the TaskIt to-do list.
//! Storage, domain rules and screen view-states live here; UI layout does not.

pub mod app;
pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod view;

pub use app::{AppConfig, AppError, AppResult, TaskApp};
pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::task::{Task, TaskId, TaskPriority, TaskValidationError};
pub use repo::preferences_repo::{
    PreferencesRepository, SqlitePreferencesRepository, ThemePreference,
};
pub use repo::task_mapper::{MappingError, TaskRecord};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository, TaskStream};
pub use repo::task_store::{TaskSnapshot, TaskStore};
pub use repo::{RepoError, RepoResult};
pub use service::task_service::TaskService;
pub use view::task_form::{DateTimeError, FormMode, TaskFormState, TaskFormViewState};
pub use view::task_list::{ListEmptyState, TaskListProjection, TaskListViewState};

/// Minimal health-check for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Version of this crate.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
