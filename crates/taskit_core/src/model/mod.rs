//! Domain model for the to-do list.
//!
//! # Invariants
//! - Domain types carry typed dates and times; string encodings live in
//!   the repository mapper only.

pub mod task;
