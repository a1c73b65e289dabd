//! Use-case services.
//!
//! # Responsibility
//! - Define the domain-facing operations screens depend on.
//! - Keep view-states independent of storage details.

pub mod task_service;
