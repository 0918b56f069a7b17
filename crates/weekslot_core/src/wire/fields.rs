//! Flattened wire fields and per-weekday persisted fields.
//!
//! `WeeklyWireFields` is what the backend receives on commit. The backend
//! stores it as up to two start/stop pairs per weekday, which is the
//! `PersistedWeeklyFields` shape read back when a schedule is edited.

use crate::calendar::weekday::Weekday;
use crate::model::draft::AppointmentType;
use crate::model::time::{parse_time_component, TimeComponent, TimeOfDay};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const LIST_SEPARATOR: char = ',';
const SLOT_SEPARATOR: char = '~';
const TIME_SEPARATOR: char = '-';

/// Wire fields sent to the slot-commit endpoint.
///
/// Field names are a compatibility contract with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyWireFields {
    /// Comma-joined full weekday names in canonical order.
    #[serde(rename = "checkedDay")]
    pub checked_day: String,
    /// Per selected day: `HH-MM-HH-MM` slots joined by `~`; days joined by `,`.
    #[serde(rename = "dayTime")]
    pub day_time: String,
    /// `timeslot` or `sequence`.
    #[serde(rename = "bookAppType")]
    pub book_app_type: String,
    /// Minutes per appointment; TIMESLOT only.
    #[serde(
        rename = "slotDuration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub slot_duration: Option<u32>,
    /// Patients per slot; SEQUENCE only.
    #[serde(
        rename = "patientCount",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub patient_count: Option<u32>,
}

/// Malformed wire input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    UnknownWeekday(String),
    UnknownAppointmentType(String),
    /// `checkedDay` and `dayTime` have different entry counts.
    DayCountMismatch { days: usize, entries: usize },
    MalformedTimePair(String),
    /// More than two slots listed for one day.
    TooManySlots { day: Weekday, count: usize },
    /// Same weekday listed twice in `checkedDay`.
    DuplicateWeekday(Weekday),
}

impl Display for WireError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownWeekday(value) => write!(f, "unknown weekday in checkedDay: `{value}`"),
            Self::UnknownAppointmentType(value) => {
                write!(f, "unknown bookAppType: `{value}`")
            }
            Self::DayCountMismatch { days, entries } => write!(
                f,
                "checkedDay lists {days} day(s) but dayTime has {entries} entr(ies)"
            ),
            Self::MalformedTimePair(value) => {
                write!(f, "malformed dayTime pair: `{value}` (expected HH-MM-HH-MM)")
            }
            Self::TooManySlots { day, count } => {
                write!(f, "{day} lists {count} slots; at most 2 are stored")
            }
            Self::DuplicateWeekday(day) => write!(f, "{day} listed twice in checkedDay"),
        }
    }
}

impl Error for WireError {}

/// One stored `(start, stop)` pair. `00:00-00:00` marks an absent pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotPair {
    pub start: TimeOfDay,
    pub stop: TimeOfDay,
}

impl SlotPair {
    pub const SENTINEL: SlotPair = SlotPair {
        start: TimeOfDay::MIDNIGHT,
        stop: TimeOfDay::MIDNIGHT,
    };

    pub fn new(start: TimeOfDay, stop: TimeOfDay) -> Self {
        Self { start, stop }
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }

    /// Parses `HH-MM-HH-MM`.
    pub fn parse_wire(value: &str) -> Result<Self, WireError> {
        let malformed = || WireError::MalformedTimePair(value.trim().to_string());
        let parts = value.trim().split(TIME_SEPARATOR).collect::<Vec<_>>();
        if parts.len() != 4 || parts.iter().any(|part| part.len() != 2) {
            return Err(malformed());
        }
        let component = |kind: TimeComponent, text: &str| {
            parse_time_component(kind, text).map_err(|_| malformed())
        };
        let start = TimeOfDay::new(
            component(TimeComponent::Hour, parts[0])?,
            component(TimeComponent::Minute, parts[1])?,
        )
        .map_err(|_| malformed())?;
        let stop = TimeOfDay::new(
            component(TimeComponent::Hour, parts[2])?,
            component(TimeComponent::Minute, parts[3])?,
        )
        .map_err(|_| malformed())?;
        Ok(Self { start, stop })
    }

    pub fn wire_form(&self) -> String {
        format!("{}-{}", self.start.wire_form(), self.stop.wire_form())
    }
}

impl Default for SlotPair {
    fn default() -> Self {
        Self::SENTINEL
    }
}

/// The two stored pairs of one weekday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayTimes {
    pub first: SlotPair,
    pub second: SlotPair,
}

impl DayTimes {
    pub fn pairs(&self) -> [SlotPair; 2] {
        [self.first, self.second]
    }

    /// Whether any pair carries a real value.
    pub fn is_available(&self) -> bool {
        !self.first.is_sentinel() || !self.second.is_sentinel()
    }
}

/// Stored shape of a weekly schedule: two pairs per weekday plus global fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedWeeklyFields {
    days: [DayTimes; 7],
    pub appointment_type: AppointmentType,
    pub slot_duration: Option<u32>,
    pub patient_count: Option<u32>,
}

impl PersistedWeeklyFields {
    /// All weekdays absent.
    pub fn empty(appointment_type: AppointmentType) -> Self {
        Self {
            days: [DayTimes::default(); 7],
            appointment_type,
            slot_duration: None,
            patient_count: None,
        }
    }

    pub fn day(&self, day: Weekday) -> &DayTimes {
        &self.days[day.index()]
    }

    pub fn set_day(&mut self, day: Weekday, times: DayTimes) {
        self.days[day.index()] = times;
    }

    /// Weekdays carrying at least one non-sentinel pair, in canonical order.
    pub fn available_days(&self) -> Vec<Weekday> {
        Weekday::ALL
            .into_iter()
            .filter(|day| self.day(*day).is_available())
            .collect()
    }

    /// Expands flattened wire fields into per-weekday pairs, positionally.
    ///
    /// The n-th `checkedDay` entry owns the n-th `dayTime` entry; within a day
    /// the first listed slot fills the first pair.
    pub fn from_wire(wire: &WeeklyWireFields) -> Result<Self, WireError> {
        let appointment_type = AppointmentType::parse_wire(&wire.book_app_type)
            .ok_or_else(|| WireError::UnknownAppointmentType(wire.book_app_type.clone()))?;

        let days = split_list(&wire.checked_day);
        let entries = split_list(&wire.day_time);
        if days.len() != entries.len() {
            return Err(WireError::DayCountMismatch {
                days: days.len(),
                entries: entries.len(),
            });
        }

        let mut fields = Self::empty(appointment_type);
        fields.slot_duration = wire.slot_duration;
        fields.patient_count = wire.patient_count;

        let mut seen = Vec::with_capacity(days.len());
        for (name, entry) in days.iter().zip(entries.iter()) {
            let day = Weekday::parse_name(name)
                .ok_or_else(|| WireError::UnknownWeekday(name.to_string()))?;
            if seen.contains(&day) {
                return Err(WireError::DuplicateWeekday(day));
            }
            seen.push(day);

            let pairs = if entry.is_empty() {
                Vec::new()
            } else {
                entry
                    .split(SLOT_SEPARATOR)
                    .map(SlotPair::parse_wire)
                    .collect::<Result<Vec<_>, _>>()?
            };
            if pairs.len() > 2 {
                return Err(WireError::TooManySlots {
                    day,
                    count: pairs.len(),
                });
            }

            fields.set_day(
                day,
                DayTimes {
                    first: pairs.first().copied().unwrap_or_default(),
                    second: pairs.get(1).copied().unwrap_or_default(),
                },
            );
        }

        Ok(fields)
    }
}

fn split_list(value: &str) -> Vec<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split(LIST_SEPARATOR).map(str::trim).collect()
}
