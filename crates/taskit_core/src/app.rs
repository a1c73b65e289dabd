//! Application state: one store per process with explicit open/close.
//!
//! # Responsibility
//! - Start logging, open the database and build the task store at startup.
//! - Hand out services and preference access by reference.
//! - Release the connection at shutdown.
//!
//! # Invariants
//! - Every service handed out shares the same store, so all view-states see
//!   each other's writes through the live snapshot.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::logging::{default_log_level, init_logging};
use crate::repo::preferences_repo::SqlitePreferencesRepository;
use crate::repo::task_repo::SqliteTaskRepository;
use crate::repo::task_store::TaskStore;
use crate::repo::RepoError;
use crate::service::task_service::TaskService;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    Logging(String),
    Db(DbError),
    Repo(RepoError),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(message) => write!(f, "logging setup failed: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(_) => None,
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<DbError> for AppError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for AppError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Startup settings supplied by the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite file holding tasks and preferences.
    pub db_path: PathBuf,
    #[serde(default = "default_level_string")]
    pub log_level: String,
    /// Absolute directory for rolling logs; `None` leaves logging untouched.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            log_level: default_level_string(),
            log_dir: None,
        }
    }
}

fn default_level_string() -> String {
    default_log_level().to_string()
}

/// Process-wide owner of the task store.
pub struct TaskApp {
    store: TaskStore,
}

impl TaskApp {
    /// Starts logging (when configured) and opens the database file.
    pub fn open(config: &AppConfig) -> AppResult<Self> {
        if let Some(log_dir) = &config.log_dir {
            init_logging(&config.log_level, &log_dir.to_string_lossy())
                .map_err(AppError::Logging)?;
        }
        let conn = open_db(&config.db_path)?;
        let app = Self::from_store(TaskStore::try_new(conn)?);
        info!(
            "event=app_open module=app status=ok mode=file db_path={}",
            config.db_path.display()
        );
        Ok(app)
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = open_db_in_memory()?;
        let app = Self::from_store(TaskStore::try_new(conn)?);
        info!("event=app_open module=app status=ok mode=memory");
        Ok(app)
    }

    fn from_store(store: TaskStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn task_service(&self) -> TaskService<SqliteTaskRepository<'_>> {
        TaskService::new(SqliteTaskRepository::new(&self.store))
    }

    pub fn preferences(&self) -> SqlitePreferencesRepository<'_> {
        SqlitePreferencesRepository::new(self.store.connection())
    }

    /// Closes the store. Live task streams end once this returns.
    pub fn close(self) -> AppResult<()> {
        match self.store.close() {
            Ok(()) => {
                info!("event=app_close module=app status=ok");
                Ok(())
            }
            Err(err) => {
                error!("event=app_close module=app status=error error={err}");
                Err(err.into())
            }
        }
    }
}

/// Default database file name inside an app data directory.
pub fn default_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("taskit.sqlite3")
}
