//! Commit-time validation of weekly schedule drafts.
//!
//! # Responsibility
//! - Check slot completeness, ordering, overlap and appointment-type fields.
//! - Keep slot 0 in the morning and slot 1 in the afternoon so stored
//!   schedules decode back to the same slots.
//! - Check the weekday selection against the draft date range.
//!
//! # Invariants
//! - Validation is pure: it never mutates the draft.
//! - All issues are collected; nothing fails fast.

use crate::calendar::range_weekdays::is_weekday_in_range;
use crate::calendar::weekday::Weekday;
use crate::model::draft::{AppointmentType, WeeklyScheduleDraft};
use crate::model::time::{SlotFill, TimeSlot, SECOND_HALF_START_HOUR};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Slot durations (minutes) accepted for TIMESLOT schedules.
pub const ALLOWED_SLOT_DURATIONS: [u32; 8] = [5, 10, 15, 20, 30, 40, 45, 60];

/// One reason a draft cannot be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// Some but not all time fields of a slot are filled.
    IncompleteSlot { index: usize },
    /// Complete slot whose start is not strictly before its end.
    InvalidOrdering { index: usize },
    /// No slot has all four time fields filled.
    NoCompleteSlot,
    /// Two complete slots share at least one minute.
    OverlappingSlots { first: usize, second: usize },
    /// Slot 0 starting in the afternoon, or slot 1 starting before it.
    SlotOutsideHalf { index: usize },
    /// TIMESLOT schedule without a slot duration.
    MissingDuration,
    /// TIMESLOT duration outside `ALLOWED_SLOT_DURATIONS`.
    UnsupportedDuration(u32),
    /// SEQUENCE slot without a positive patient count.
    MissingCapacity { index: usize },
    /// SEQUENCE slots with different patient counts.
    CapacityMismatch,
    /// No weekday selected.
    NoDaysSelected,
    /// Selected weekday does not occur in the date range.
    DayOutOfRange(Weekday),
}

impl ValidationIssue {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::IncompleteSlot { .. } => "incomplete_slot",
            Self::InvalidOrdering { .. } => "invalid_ordering",
            Self::NoCompleteSlot => "no_complete_slot",
            Self::OverlappingSlots { .. } => "overlapping_slots",
            Self::SlotOutsideHalf { .. } => "slot_outside_half",
            Self::MissingDuration => "missing_duration",
            Self::UnsupportedDuration(_) => "unsupported_duration",
            Self::MissingCapacity { .. } => "missing_capacity",
            Self::CapacityMismatch => "capacity_mismatch",
            Self::NoDaysSelected => "no_days_selected",
            Self::DayOutOfRange(_) => "day_out_of_range",
        }
    }

    /// Slot the issue points at, for per-slot display.
    pub fn slot_index(&self) -> Option<usize> {
        match self {
            Self::IncompleteSlot { index }
            | Self::InvalidOrdering { index }
            | Self::SlotOutsideHalf { index }
            | Self::MissingCapacity { index } => Some(*index),
            Self::OverlappingSlots { second, .. } => Some(*second),
            _ => None,
        }
    }
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IncompleteSlot { index } => {
                write!(f, "slot {}: all time fields must be filled", index + 1)
            }
            Self::InvalidOrdering { index } => write!(
                f,
                "slot {}: start time must be before end time",
                index + 1
            ),
            Self::NoCompleteSlot => write!(f, "at least one complete time slot is required"),
            Self::OverlappingSlots { first, second } => write!(
                f,
                "slot {} overlaps slot {}",
                second + 1,
                first + 1
            ),
            Self::SlotOutsideHalf { index: 0 } => write!(
                f,
                "slot 1 must start before {SECOND_HALF_START_HOUR:02}:00"
            ),
            Self::SlotOutsideHalf { index } => write!(
                f,
                "slot {} must start at {SECOND_HALF_START_HOUR:02}:00 or later",
                index + 1
            ),
            Self::MissingDuration => write!(f, "slot duration is required for timeslot schedules"),
            Self::UnsupportedDuration(value) => write!(
                f,
                "slot duration {value} is not one of {ALLOWED_SLOT_DURATIONS:?} minutes"
            ),
            Self::MissingCapacity { index } => write!(
                f,
                "slot {}: patient count must be a positive number",
                index + 1
            ),
            Self::CapacityMismatch => {
                write!(f, "all sequence slots must admit the same patient count")
            }
            Self::NoDaysSelected => write!(f, "select at least one day"),
            Self::DayOutOfRange(day) => {
                write!(f, "{day} does not occur in the selected date range")
            }
        }
    }
}

impl Error for ValidationIssue {}

/// Validates a draft for commit and returns every issue found.
pub fn validate(draft: &WeeklyScheduleDraft) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut complete = Vec::new();
    let mut ordered: Vec<(usize, TimeSlot)> = Vec::new();

    for (index, slot) in draft.slots().iter().enumerate() {
        match slot.fill() {
            SlotFill::Empty => {}
            SlotFill::Partial => issues.push(ValidationIssue::IncompleteSlot { index }),
            SlotFill::Complete => {
                complete.push(index);
                match slot.to_time_slot() {
                    Some(time_slot) => {
                        if !time_slot.starts_in_half_of(index) {
                            issues.push(ValidationIssue::SlotOutsideHalf { index });
                        }
                        ordered.push((index, time_slot));
                    }
                    None => issues.push(ValidationIssue::InvalidOrdering { index }),
                }
            }
        }
    }

    if complete.is_empty() {
        issues.push(ValidationIssue::NoCompleteSlot);
    }

    for (position, (first, first_slot)) in ordered.iter().enumerate() {
        for (second, second_slot) in ordered.iter().skip(position + 1) {
            if first_slot.overlaps(second_slot) {
                issues.push(ValidationIssue::OverlappingSlots {
                    first: *first,
                    second: *second,
                });
            }
        }
    }

    match draft.appointment_type() {
        AppointmentType::Timeslot => match draft.slot_duration_minutes() {
            None => issues.push(ValidationIssue::MissingDuration),
            Some(minutes) if !ALLOWED_SLOT_DURATIONS.contains(&minutes) => {
                issues.push(ValidationIssue::UnsupportedDuration(minutes));
            }
            Some(_) => {}
        },
        AppointmentType::Sequence => {
            let mut capacities = BTreeSet::new();
            for index in &complete {
                match draft.slots()[*index].capacity {
                    Some(capacity) if capacity > 0 => {
                        capacities.insert(capacity);
                    }
                    _ => issues.push(ValidationIssue::MissingCapacity { index: *index }),
                }
            }
            if capacities.len() > 1 {
                issues.push(ValidationIssue::CapacityMismatch);
            }
        }
    }

    if draft.selected_weekdays().is_empty() {
        issues.push(ValidationIssue::NoDaysSelected);
    }
    for day in draft.selected_weekdays() {
        if !is_weekday_in_range(*day, draft.date_range()) {
            issues.push(ValidationIssue::DayOutOfRange(*day));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::{validate, ValidationIssue};
    use crate::calendar::date_range::DateRange;
    use crate::calendar::weekday::Weekday;
    use crate::model::draft::{AppointmentType, WeeklyScheduleDraft};
    use crate::model::time::SlotField;

    fn draft_with_slots(slots: &[(&str, &str, &str, &str)]) -> WeeklyScheduleDraft {
        let mut draft =
            WeeklyScheduleDraft::new(DateRange::parse("01/09/2025", "30/09/2025").unwrap());
        draft.select_weekday(Weekday::Monday).unwrap();
        draft.set_slot_duration(Some(15));
        for (from_hour, from_minute, to_hour, to_minute) in slots {
            let index = draft.add_slot().unwrap();
            draft
                .set_slot_field(index, SlotField::FromHour, from_hour)
                .unwrap();
            draft
                .set_slot_field(index, SlotField::FromMinute, from_minute)
                .unwrap();
            draft
                .set_slot_field(index, SlotField::ToHour, to_hour)
                .unwrap();
            draft
                .set_slot_field(index, SlotField::ToMinute, to_minute)
                .unwrap();
        }
        draft
    }

    #[test]
    fn valid_two_slot_draft_has_no_issues() {
        let draft = draft_with_slots(&[("09", "00", "12", "00"), ("14", "00", "17", "30")]);
        assert!(validate(&draft).is_empty());
    }

    #[test]
    fn empty_slot_is_ignored_but_does_not_count_as_complete() {
        let draft = draft_with_slots(&[("", "", "", "")]);
        assert_eq!(validate(&draft), vec![ValidationIssue::NoCompleteSlot]);
    }

    #[test]
    fn misordered_slot_is_not_checked_for_overlap() {
        let draft = draft_with_slots(&[("16", "00", "13", "00"), ("13", "30", "14", "00")]);
        assert_eq!(
            validate(&draft),
            vec![ValidationIssue::InvalidOrdering { index: 0 }]
        );
    }

    #[test]
    fn timeslot_duration_must_be_allowed() {
        let mut draft = draft_with_slots(&[("09", "00", "10", "00")]);
        draft.set_slot_duration(None);
        assert_eq!(validate(&draft), vec![ValidationIssue::MissingDuration]);
        draft.set_slot_duration(Some(25));
        assert_eq!(
            validate(&draft),
            vec![ValidationIssue::UnsupportedDuration(25)]
        );
    }

    #[test]
    fn sequence_requires_uniform_positive_capacity() {
        let mut draft = draft_with_slots(&[("09", "00", "10", "00"), ("14", "00", "15", "00")]);
        draft.set_appointment_type(AppointmentType::Sequence);
        draft.set_slot_duration(None);
        draft.set_slot_capacity(0, Some(0)).unwrap();
        assert_eq!(
            validate(&draft),
            vec![
                ValidationIssue::MissingCapacity { index: 0 },
                ValidationIssue::MissingCapacity { index: 1 },
            ]
        );

        draft.set_slot_capacity(0, Some(8)).unwrap();
        draft.set_slot_capacity(1, Some(6)).unwrap();
        assert_eq!(validate(&draft), vec![ValidationIssue::CapacityMismatch]);

        draft.set_slot_capacity(1, Some(8)).unwrap();
        assert!(validate(&draft).is_empty());
    }

    #[test]
    fn issue_codes_are_stable() {
        assert_eq!(ValidationIssue::NoCompleteSlot.code(), "no_complete_slot");
        assert_eq!(
            ValidationIssue::OverlappingSlots {
                first: 0,
                second: 1
            }
            .slot_index(),
            Some(1)
        );
        assert_eq!(
            ValidationIssue::IncompleteSlot { index: 1 }.to_string(),
            "slot 2: all time fields must be filled"
        );
        assert_eq!(
            ValidationIssue::SlotOutsideHalf { index: 1 }.to_string(),
            "slot 2 must start at 13:00 or later"
        );
    }
}
