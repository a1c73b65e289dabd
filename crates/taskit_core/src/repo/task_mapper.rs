//! Conversion between stored task rows and domain tasks.
//!
//! # Invariants
//! - `to_domain(&to_record(t)) == Ok(t)` for every task.
//! - `to_record(&to_domain(r)?) == r` for every record `to_domain` accepts.
//! - Only the canonical text written by `to_record` decodes. Anything else,
//!   including unpadded or shortened ISO-8601, is a data-integrity failure
//!   and never silently defaulted.

use crate::model::task::{Task, TaskId, TaskPriority};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Persisted shape of a task: scalars and ISO-8601 text only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub date: String,
    pub time: Option<String>,
    pub location: Option<String>,
    pub is_completed: bool,
    pub created_at: String,
}

/// A stored row that cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    InvalidDate { id: TaskId, value: String },
    InvalidTime { id: TaskId, value: String },
    InvalidCreatedAt { id: TaskId, value: String },
    InvalidPriority { id: TaskId, value: String },
}

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate { id, value } => {
                write!(f, "task {id}: invalid date `{value}`")
            }
            Self::InvalidTime { id, value } => {
                write!(f, "task {id}: invalid time `{value}`")
            }
            Self::InvalidCreatedAt { id, value } => {
                write!(f, "task {id}: invalid created_at `{value}`")
            }
            Self::InvalidPriority { id, value } => {
                write!(f, "task {id}: invalid priority `{value}`")
            }
        }
    }
}

impl Error for MappingError {}

/// Encodes a domain task for storage.
pub fn to_record(task: &Task) -> TaskRecord {
    TaskRecord {
        id: task.id,
        title: task.title.clone(),
        description: task.description.clone(),
        priority: priority_to_db(task.priority).to_string(),
        date: task.date.format(DATE_FORMAT).to_string(),
        time: task.time.map(|time| time.format(TIME_FORMAT).to_string()),
        location: task.location.clone(),
        is_completed: task.is_completed,
        created_at: task.created_at.format(DATE_TIME_FORMAT).to_string(),
    }
}

/// Decodes a stored row into a domain task.
pub fn to_domain(record: &TaskRecord) -> Result<Task, MappingError> {
    let id = record.id;

    let priority =
        parse_priority(&record.priority).ok_or_else(|| MappingError::InvalidPriority {
            id,
            value: record.priority.clone(),
        })?;

    let date = parse_canonical(
        &record.date,
        DATE_FORMAT,
        NaiveDate::parse_from_str,
        |date| date.format(DATE_FORMAT).to_string(),
    )
    .ok_or_else(|| MappingError::InvalidDate {
        id,
        value: record.date.clone(),
    })?;

    let time = match &record.time {
        Some(value) => Some(
            parse_canonical(
                value,
                TIME_FORMAT,
                NaiveTime::parse_from_str,
                |time| time.format(TIME_FORMAT).to_string(),
            )
            .ok_or_else(|| MappingError::InvalidTime {
                id,
                value: value.clone(),
            })?,
        ),
        None => None,
    };

    let created_at = parse_canonical(
        &record.created_at,
        DATE_TIME_FORMAT,
        NaiveDateTime::parse_from_str,
        |created_at| created_at.format(DATE_TIME_FORMAT).to_string(),
    )
    .ok_or_else(|| MappingError::InvalidCreatedAt {
        id,
        value: record.created_at.clone(),
    })?;

    Ok(Task {
        id,
        title: record.title.clone(),
        description: record.description.clone(),
        priority,
        date,
        time,
        location: record.location.clone(),
        is_completed: record.is_completed,
        created_at,
    })
}

pub(crate) fn priority_to_db(priority: TaskPriority) -> &'static str {
    match priority {
        TaskPriority::Low => "LOW",
        TaskPriority::Medium => "MEDIUM",
        TaskPriority::High => "HIGH",
        TaskPriority::Critical => "CRITICAL",
    }
}

fn parse_priority(value: &str) -> Option<TaskPriority> {
    match value {
        "LOW" => Some(TaskPriority::Low),
        "MEDIUM" => Some(TaskPriority::Medium),
        "HIGH" => Some(TaskPriority::High),
        "CRITICAL" => Some(TaskPriority::Critical),
        _ => None,
    }
}

// chrono accepts unpadded fields and fractions of any width, so a parse only
// counts when encoding the value gives back the stored text.
fn parse_canonical<T>(
    value: &str,
    format: &str,
    parse: fn(&str, &str) -> chrono::ParseResult<T>,
    encode: impl Fn(&T) -> String,
) -> Option<T> {
    let parsed = parse(value, format).ok()?;
    (encode(&parsed) == value).then_some(parsed)
}
