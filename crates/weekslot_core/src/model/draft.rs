//! Weekly schedule draft aggregate.
//!
//! # Responsibility
//! - Own every editable field of one weekly schedule being created or edited.
//! - Apply slot and day edits through explicit operations.
//!
//! # Invariants
//! - At most `MAX_SLOTS` slot inputs exist at any time.
//! - Every selected weekday occurs in `date_range`; changing the range prunes
//!   the selection.
//! - Slot ordering, overlap and completeness are not enforced here; see
//!   `validation::validate`.

use crate::calendar::date_range::DateRange;
use crate::calendar::range_weekdays::{is_weekday_in_range, prune_selection};
use crate::calendar::weekday::Weekday;
use crate::model::time::{SlotField, SlotInput, TimeFieldError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum number of slot inputs per schedule.
pub const MAX_SLOTS: usize = 2;

/// Appointment admission policy for the whole schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentType {
    /// Fixed-duration appointments inside each slot.
    #[default]
    Timeslot,
    /// Fixed number of patients admitted per slot.
    Sequence,
}

impl AppointmentType {
    /// Lower-cased wire value (`bookAppType`).
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Timeslot => "timeslot",
            Self::Sequence => "sequence",
        }
    }

    /// Parses a wire value case-insensitively.
    pub fn parse_wire(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "timeslot" => Some(Self::Timeslot),
            "sequence" => Some(Self::Sequence),
            _ => None,
        }
    }
}

impl Display for AppointmentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Rejected draft edit. The draft is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    /// `add_slot` called with `MAX_SLOTS` slots present.
    SlotLimitReached,
    /// Slot index does not exist.
    SlotIndexOutOfRange { index: usize, len: usize },
    /// Time field text was rejected.
    InvalidTimeField {
        index: usize,
        field: SlotField,
        source: TimeFieldError,
    },
    /// Weekday does not occur in the current date range.
    DayOutOfRange(Weekday),
}

impl Display for DraftError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SlotLimitReached => write!(f, "a schedule supports at most {MAX_SLOTS} slots"),
            Self::SlotIndexOutOfRange { index, len } => {
                write!(f, "slot index {index} out of range (slots: {len})")
            }
            Self::InvalidTimeField { index, field, source } => {
                write!(f, "slot {index} {field:?}: {source}")
            }
            Self::DayOutOfRange(day) => {
                write!(f, "{day} does not occur in the selected date range")
            }
        }
    }
}

impl Error for DraftError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTimeField { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Canonical editable weekly schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyScheduleDraft {
    date_range: DateRange,
    selected_weekdays: BTreeSet<Weekday>,
    slots: Vec<SlotInput>,
    appointment_type: AppointmentType,
    slot_duration_minutes: Option<u32>,
}

impl WeeklyScheduleDraft {
    /// Creates an empty draft: no days, no slots, TIMESLOT without duration.
    pub fn new(date_range: DateRange) -> Self {
        Self {
            date_range,
            selected_weekdays: BTreeSet::new(),
            slots: Vec::new(),
            appointment_type: AppointmentType::Timeslot,
            slot_duration_minutes: None,
        }
    }

    /// Assembles a draft from decoded storage without re-checking day membership.
    pub(crate) fn from_parts(
        date_range: DateRange,
        selected_weekdays: BTreeSet<Weekday>,
        mut slots: Vec<SlotInput>,
        appointment_type: AppointmentType,
        slot_duration_minutes: Option<u32>,
    ) -> Self {
        slots.truncate(MAX_SLOTS);
        Self {
            date_range,
            selected_weekdays,
            slots,
            appointment_type,
            slot_duration_minutes,
        }
    }

    pub fn date_range(&self) -> &DateRange {
        &self.date_range
    }

    pub fn selected_weekdays(&self) -> &BTreeSet<Weekday> {
        &self.selected_weekdays
    }

    pub fn slots(&self) -> &[SlotInput] {
        &self.slots
    }

    pub fn appointment_type(&self) -> AppointmentType {
        self.appointment_type
    }

    pub fn slot_duration_minutes(&self) -> Option<u32> {
        self.slot_duration_minutes
    }

    /// Slot inputs with all four time fields filled, with their indexes.
    pub fn complete_slots(&self) -> impl Iterator<Item = (usize, &SlotInput)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_complete())
    }

    /// Appends an empty slot and returns its index.
    pub fn add_slot(&mut self) -> Result<usize, DraftError> {
        if self.slots.len() >= MAX_SLOTS {
            return Err(DraftError::SlotLimitReached);
        }
        self.slots.push(SlotInput::empty());
        Ok(self.slots.len() - 1)
    }

    /// Removes a slot. Leaving zero slots is legal while editing.
    pub fn remove_slot(&mut self, index: usize) -> Result<SlotInput, DraftError> {
        self.check_index(index)?;
        Ok(self.slots.remove(index))
    }

    /// Sets one time field from text without checking slot ordering.
    pub fn set_slot_field(
        &mut self,
        index: usize,
        field: SlotField,
        text: &str,
    ) -> Result<(), DraftError> {
        self.check_index(index)?;
        self.slots[index]
            .set_field(field, text)
            .map_err(|source| DraftError::InvalidTimeField {
                index,
                field,
                source,
            })
    }

    pub fn set_slot_capacity(
        &mut self,
        index: usize,
        capacity: Option<u32>,
    ) -> Result<(), DraftError> {
        self.check_index(index)?;
        self.slots[index].capacity = capacity;
        Ok(())
    }

    pub fn set_appointment_type(&mut self, appointment_type: AppointmentType) {
        self.appointment_type = appointment_type;
    }

    pub fn set_slot_duration(&mut self, minutes: Option<u32>) {
        self.slot_duration_minutes = minutes;
    }

    /// Replaces slots with one empty slot and resets the type to TIMESLOT.
    pub fn reset_slots(&mut self) {
        self.slots = vec![SlotInput::empty()];
        self.appointment_type = AppointmentType::Timeslot;
    }

    /// Adds `day` to the selection. Returns `false` when it was already selected.
    pub fn select_weekday(&mut self, day: Weekday) -> Result<bool, DraftError> {
        if !is_weekday_in_range(day, &self.date_range) {
            return Err(DraftError::DayOutOfRange(day));
        }
        Ok(self.selected_weekdays.insert(day))
    }

    /// Removes `day` from the selection. Returns `false` when it was not selected.
    pub fn deselect_weekday(&mut self, day: Weekday) -> bool {
        self.selected_weekdays.remove(&day)
    }

    /// Replaces the whole selection; rejects it entirely if any day is out of range.
    pub fn replace_selection(&mut self, days: BTreeSet<Weekday>) -> Result<(), DraftError> {
        if let Some(day) = days
            .iter()
            .copied()
            .find(|day| !is_weekday_in_range(*day, &self.date_range))
        {
            return Err(DraftError::DayOutOfRange(day));
        }
        self.selected_weekdays = days;
        Ok(())
    }

    /// Moves the draft to a new range and prunes days that no longer occur.
    ///
    /// Returns the dropped days in canonical order.
    pub fn set_date_range(&mut self, date_range: DateRange) -> Vec<Weekday> {
        self.date_range = date_range;
        prune_selection(&mut self.selected_weekdays, &self.date_range)
    }

    fn check_index(&self, index: usize) -> Result<(), DraftError> {
        if index >= self.slots.len() {
            return Err(DraftError::SlotIndexOutOfRange {
                index,
                len: self.slots.len(),
            });
        }
        Ok(())
    }
}
