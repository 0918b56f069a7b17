//! Editable weekly schedule model.
//!
//! # Responsibility
//! - Define time-of-day values, slot inputs and the draft aggregate.
//!
//! # Invariants
//! - Time values are range-checked at construction.
//! - The draft never holds more than `draft::MAX_SLOTS` slots.

pub mod draft;
pub mod time;
