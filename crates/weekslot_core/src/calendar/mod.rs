//! Calendar primitives for weekly schedules.
//!
//! # Responsibility
//! - Model the seven ISO weekdays in canonical Monday-first order.
//! - Parse and hold inclusive calendar date ranges.
//! - Compute which weekdays actually occur inside a range.
//!
//! # Invariants
//! - `DateRange::start() <= DateRange::end()` for every constructed range.
//! - Weekday selections never keep a day that does not occur in the range.

pub mod date_range;
pub mod range_weekdays;
pub mod weekday;
