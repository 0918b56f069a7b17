//! Wire format shared with the scheduling backend.
//!
//! # Responsibility
//! - Define the flattened commit fields (`checkedDay`, `dayTime`,
//!   `bookAppType`, `slotDuration`) and the per-weekday stored shape.
//! - Translate between those shapes and `WeeklyScheduleDraft`.
//!
//! # Invariants
//! - Wire field names are reproduced byte-for-byte.
//! - Appointment type and duration are global to a schedule, never per day.

pub mod codec;
pub mod fields;
