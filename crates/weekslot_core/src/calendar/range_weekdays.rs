//! Weekday-in-range calculation and selection pruning.
//!
//! # Responsibility
//! - Report which weekdays occur between two dates inclusive.
//! - Drop selected weekdays that no longer occur after a range change.
//!
//! # Invariants
//! - Ranges of seven or more days always yield all seven weekdays.
//! - Unparsable ranges only widen to "all weekdays" through
//!   `allowed_weekdays_or_all`, which reports the fallback reason.

use crate::calendar::date_range::{CalendarError, DateRange};
use crate::calendar::weekday::Weekday;
use chrono::Datelike;
use log::warn;
use std::collections::BTreeSet;

/// Returns the distinct weekdays touched by `range`.
pub fn weekdays_in_range(range: &DateRange) -> BTreeSet<Weekday> {
    let mut found = BTreeSet::new();
    for date in range.days() {
        found.insert(Weekday::from(date.weekday()));
        if found.len() == Weekday::ALL.len() {
            break;
        }
    }
    found
}

/// Parses textual endpoints (`DD/MM/YYYY` or `DD.MM.YY`) and returns their weekdays.
///
/// # Errors
/// - `CalendarError::InvalidDate` when either endpoint fails to parse.
/// - `CalendarError::ReversedRange` when `start` is after `end`.
pub fn weekdays_in_text_range(start: &str, end: &str) -> Result<BTreeSet<Weekday>, CalendarError> {
    let range = DateRange::parse(start, end)?;
    Ok(weekdays_in_range(&range))
}

/// Returns whether `day` occurs at least once inside `range`.
pub fn is_weekday_in_range(day: Weekday, range: &DateRange) -> bool {
    if range.len_days() >= Weekday::ALL.len() as i64 {
        return true;
    }
    range
        .days()
        .any(|date| Weekday::from(date.weekday()) == day)
}

/// Removes every selected day that does not occur in `range`.
///
/// Returns the dropped days in canonical order so callers can warn the user.
pub fn prune_selection(selected: &mut BTreeSet<Weekday>, range: &DateRange) -> Vec<Weekday> {
    let allowed = weekdays_in_range(range);
    let dropped = selected
        .iter()
        .copied()
        .filter(|day| !allowed.contains(day))
        .collect::<Vec<_>>();
    for day in &dropped {
        selected.remove(day);
    }
    dropped
}

/// Selectable weekdays for a textual range, with explicit fallback reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedWeekdays {
    /// Weekdays the caller may offer for selection.
    pub days: BTreeSet<Weekday>,
    /// Parse failure that forced the all-weekdays fallback, if any.
    pub fallback_reason: Option<CalendarError>,
}

impl AllowedWeekdays {
    pub fn is_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Resolves selectable weekdays, falling back to all seven when the range is unparsable.
pub fn allowed_weekdays_or_all(start: &str, end: &str) -> AllowedWeekdays {
    match weekdays_in_text_range(start, end) {
        Ok(days) => AllowedWeekdays {
            days,
            fallback_reason: None,
        },
        Err(err) => {
            warn!(
                "event=weekday_range module=calendar status=fallback error_code={}",
                calendar_error_code(&err)
            );
            AllowedWeekdays {
                days: Weekday::ALL.into_iter().collect(),
                fallback_reason: Some(err),
            }
        }
    }
}

fn calendar_error_code(err: &CalendarError) -> &'static str {
    match err {
        CalendarError::InvalidDate(_) => "invalid_date",
        CalendarError::ReversedRange { .. } => "reversed_range",
    }
}
