//! Persistence layer: task store, mapper, repository facade and preferences.
//!
//! # Responsibility
//! - Keep SQL and string encodings behind domain-typed interfaces.
//! - Report semantic failures (`NotFound`, `MalformedRecord`) separately
//!   from storage transport failures.
//!
//! # Invariants
//! - Repository writes call `Task::validate()` before any SQL.
//! - Reads reject malformed rows instead of masking them.

use crate::db::DbError;
use crate::model::task::{TaskId, TaskValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod preferences_repo;
pub mod task_mapper;
pub mod task_repo;
pub mod task_store;

use task_mapper::MappingError;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error kinds surfaced by task persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Task failed field validation; nothing was written.
    Validation(TaskValidationError),
    /// Underlying SQLite failure.
    Storage(DbError),
    /// Update or lookup targeted an id that does not exist.
    NotFound(TaskId),
    /// A stored row could not be decoded. Not recoverable by retrying.
    MalformedRecord(MappingError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid task: {err}"),
            Self::Storage(err) => write!(f, "storage error: {err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::MalformedRecord(err) => write!(f, "malformed task record: {err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is older than required {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::MalformedRecord(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<MappingError> for RepoError {
    fn from(value: MappingError) -> Self {
        Self::MalformedRecord(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Storage(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(DbError::Sqlite(value))
    }
}
