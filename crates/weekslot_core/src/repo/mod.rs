//! Repository layer for committed weekly schedules.
//!
//! # Responsibility
//! - Define the schedule data access contract.
//! - Isolate SQLite query details from session orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `Wire`) in addition
//!   to DB transport errors.

pub mod schedule_repo;
