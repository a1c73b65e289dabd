//! Screen view-states.
//!
//! # Responsibility
//! - Hold display state and user intents for the list and form screens.
//! - Talk to storage only through [`TaskService`](crate::service::task_service::TaskService).

pub mod task_form;
pub mod task_list;
