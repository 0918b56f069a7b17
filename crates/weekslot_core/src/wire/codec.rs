//! Draft <-> wire translation.
//!
//! # Responsibility
//! - Encode a validated draft into `WeeklyWireFields`.
//! - Rebuild a canonical draft from `PersistedWeeklyFields` for editing.
//!
//! # Invariants
//! - `checkedDay` follows canonical weekday order, never selection order.
//! - `dayTime` repeats the uniform per-day slot string once per selected day;
//!   the backend indexes both lists positionally.
//! - Decode is deterministic: slot 1 comes from pairs starting before 13:00,
//!   slot 2 from pairs starting at 13:00 or later.

use crate::calendar::date_range::DateRange;
use crate::calendar::weekday::Weekday;
use crate::model::draft::{AppointmentType, WeeklyScheduleDraft};
use crate::model::time::SlotInput;
use crate::wire::fields::{PersistedWeeklyFields, SlotPair, WeeklyWireFields};
use log::{debug, warn};
use std::collections::BTreeSet;

/// Encodes a draft into backend wire fields.
///
/// Only complete slots are emitted. Callers are expected to run
/// `validation::validate` first; encode itself does not reject anything.
pub fn encode(draft: &WeeklyScheduleDraft) -> WeeklyWireFields {
    let days = draft.selected_weekdays().iter().copied().collect::<Vec<_>>();

    let checked_day = days
        .iter()
        .map(|day| day.full_name())
        .collect::<Vec<_>>()
        .join(",");

    let per_day = draft
        .complete_slots()
        .filter_map(|(_, slot)| slot.endpoints())
        .map(|(from, to)| SlotPair::new(from, to).wire_form())
        .collect::<Vec<_>>()
        .join("~");
    let day_time = vec![per_day.as_str(); days.len()].join(",");

    let (slot_duration, patient_count) = match draft.appointment_type() {
        AppointmentType::Timeslot => (draft.slot_duration_minutes(), None),
        AppointmentType::Sequence => (
            None,
            draft
                .complete_slots()
                .find_map(|(_, slot)| slot.capacity),
        ),
    };

    WeeklyWireFields {
        checked_day,
        day_time,
        book_app_type: draft.appointment_type().wire_name().to_string(),
        slot_duration,
        patient_count,
    }
}

/// Rebuilds an editable draft from stored per-weekday fields.
///
/// # Contract
/// - A weekday is selected when it carries any non-sentinel pair.
/// - One representative pair per half of the day; the first seen in
///   canonical weekday order (then pair order) wins.
/// - The result always offers slot inputs: `[slot1, placeholder]`,
///   `[placeholder, slot2]`, `[slot1, slot2]`, or a single default slot when
///   nothing is stored.
/// - SEQUENCE capacity comes from the stored patient count.
pub fn decode(fields: &PersistedWeeklyFields, date_range: DateRange) -> WeeklyScheduleDraft {
    let mut selected = BTreeSet::new();
    let mut first_half: Option<SlotPair> = None;
    let mut second_half: Option<SlotPair> = None;
    let mut ambiguous_days = Vec::new();

    for day in Weekday::ALL {
        for pair in fields.day(day).pairs() {
            if pair.is_sentinel() {
                continue;
            }
            selected.insert(day);

            let representative = if pair.start.is_second_half() {
                &mut second_half
            } else {
                &mut first_half
            };
            match *representative {
                None => *representative = Some(pair),
                Some(existing) if existing != pair => {
                    if !ambiguous_days.contains(&day) {
                        ambiguous_days.push(day);
                    }
                }
                Some(_) => {}
            }
        }
    }

    if !ambiguous_days.is_empty() {
        warn!(
            "event=schedule_decode module=wire status=ambiguous days={}",
            ambiguous_days
                .iter()
                .map(|day| day.full_name())
                .collect::<Vec<_>>()
                .join("|")
        );
    }

    let capacity = match fields.appointment_type {
        AppointmentType::Sequence => fields.patient_count,
        AppointmentType::Timeslot => None,
    };
    let to_input =
        |pair: SlotPair| SlotInput::from_endpoints(pair.start, pair.stop).with_capacity(capacity);

    let slots = match (first_half, second_half) {
        (Some(first), Some(second)) => vec![to_input(first), to_input(second)],
        (Some(first), None) => vec![to_input(first), SlotInput::empty()],
        (None, Some(second)) => vec![SlotInput::empty(), to_input(second)],
        (None, None) => vec![SlotInput::empty().with_capacity(capacity)],
    };

    debug!(
        "event=schedule_decode module=wire status=ok days={} slots={}",
        selected.len(),
        slots.iter().filter(|slot| slot.is_complete()).count()
    );

    WeeklyScheduleDraft::from_parts(
        date_range,
        selected,
        slots,
        fields.appointment_type,
        fields.slot_duration,
    )
}
