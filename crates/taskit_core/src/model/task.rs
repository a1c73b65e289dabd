//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical to-do record handled by every layer above the store.
//! - Own the field limits and persistence-time validation rules.
//!
//! # Invariants
//! - `id == 0` means "not yet persisted"; the store assigns ids on insert.
//! - `created_at` is set once at creation and copied verbatim by updates.
//! - A persistable task has a non-blank title and, if present, a non-blank location.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned task identifier. `0` marks an unsaved task.
pub type TaskId = i64;

/// Id carried by tasks that have not been inserted yet.
pub const UNSAVED_TASK_ID: TaskId = 0;

pub const TITLE_MAX_CHARS: usize = 50;
pub const DESCRIPTION_MAX_CHARS: usize = 200;
pub const LOCATION_MAX_CHARS: usize = 100;

/// Ordered task importance. Declaration order is the sort order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    /// All priorities in ascending order, as shown by filter chips.
    pub const ALL: [TaskPriority; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

/// Field-level reasons a task cannot be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyTitle,
    TitleTooLong { chars: usize, max: usize },
    DescriptionTooLong { chars: usize, max: usize },
    LocationTooLong { chars: usize, max: usize },
    /// Blank locations must be stored as absent.
    BlankLocation,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be blank"),
            Self::TitleTooLong { chars, max } => {
                write!(f, "title has {chars} characters; max is {max}")
            }
            Self::DescriptionTooLong { chars, max } => {
                write!(f, "description has {chars} characters; max is {max}")
            }
            Self::LocationTooLong { chars, max } => {
                write!(f, "location has {chars} characters; max is {max}")
            }
            Self::BlankLocation => write!(f, "location must be absent instead of blank"),
        }
    }
}

impl Error for TaskValidationError {}

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub date: NaiveDate,
    /// `None` for a date-only task.
    pub time: Option<NaiveTime>,
    pub location: Option<String>,
    pub is_completed: bool,
    pub created_at: NaiveDateTime,
}

impl Task {
    /// Creates an unsaved, incomplete task with no time, location or description.
    pub fn new(
        title: impl Into<String>,
        priority: TaskPriority,
        date: NaiveDate,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: UNSAVED_TASK_ID,
            title: title.into(),
            description: String::new(),
            priority,
            date,
            time: None,
            location: None,
            is_completed: false,
            created_at,
        }
    }

    /// Returns whether the store has assigned this task an id.
    pub fn is_persisted(&self) -> bool {
        self.id != UNSAVED_TASK_ID
    }

    /// Copy of this task with the completion flag flipped.
    pub fn with_completed_toggled(&self) -> Self {
        Self {
            is_completed: !self.is_completed,
            ..self.clone()
        }
    }

    /// Point in time the task is scheduled for. Date-only tasks resolve to
    /// the start of their day.
    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time.unwrap_or(NaiveTime::MIN))
    }

    /// Checks the rules every stored task must satisfy.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        let chars = self.title.chars().count();
        if chars > TITLE_MAX_CHARS {
            return Err(TaskValidationError::TitleTooLong {
                chars,
                max: TITLE_MAX_CHARS,
            });
        }
        let chars = self.description.chars().count();
        if chars > DESCRIPTION_MAX_CHARS {
            return Err(TaskValidationError::DescriptionTooLong {
                chars,
                max: DESCRIPTION_MAX_CHARS,
            });
        }
        if let Some(location) = &self.location {
            if location.trim().is_empty() {
                return Err(TaskValidationError::BlankLocation);
            }
            let chars = location.chars().count();
            if chars > LOCATION_MAX_CHARS {
                return Err(TaskValidationError::LocationTooLong {
                    chars,
                    max: LOCATION_MAX_CHARS,
                });
            }
        }
        Ok(())
    }
}

/// Keeps at most `max_chars` characters of `value`.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// Trims `value` and maps a blank result to `None`.
pub fn normalize_location(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
