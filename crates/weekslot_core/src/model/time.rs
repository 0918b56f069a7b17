//! Time-of-day values and editable slot inputs.
//!
//! # Responsibility
//! - Parse hour/minute text fields at the boundary.
//! - Hold partially typed slots without losing what the user entered.
//! - Expose complete slots as minute-resolution intervals.
//!
//! # Invariants
//! - A stored `TimeOfDay` always has `hour <= 23` and `minute <= 59`.
//! - Malformed field text is rejected, never stored.
//! - A `TimeSlot` always satisfies `from < to`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// First hour that belongs to the second half of the day.
pub const SECOND_HALF_START_HOUR: u8 = 13;

static TIME_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{1,2}$").expect("valid time field regex"));

/// Which half of a `TimeOfDay` a text field describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeComponent {
    Hour,
    Minute,
}

impl TimeComponent {
    fn max_value(self) -> u8 {
        match self {
            Self::Hour => 23,
            Self::Minute => 59,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Minute => "minute",
        }
    }
}

/// Rejected time field input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeFieldError {
    /// Text is not one or two ASCII digits.
    Malformed {
        component: TimeComponent,
        value: String,
    },
    /// Digits parse but exceed the component maximum.
    OutOfRange { component: TimeComponent, value: u8 },
}

impl Display for TimeFieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed { component, value } => {
                write!(f, "{} field is malformed: `{value}`", component.label())
            }
            Self::OutOfRange { component, value } => write!(
                f,
                "{} value {value} exceeds {}",
                component.label(),
                component.max_value()
            ),
        }
    }
}

impl Error for TimeFieldError {}

/// Parses one hour or minute text field.
pub fn parse_time_component(component: TimeComponent, text: &str) -> Result<u8, TimeFieldError> {
    let trimmed = text.trim();
    if !TIME_FIELD_RE.is_match(trimmed) {
        return Err(TimeFieldError::Malformed {
            component,
            value: trimmed.to_string(),
        });
    }
    let value = trimmed
        .parse::<u8>()
        .map_err(|_| TimeFieldError::Malformed {
            component,
            value: trimmed.to_string(),
        })?;
    check_component(component, value)
}

fn check_component(component: TimeComponent, value: u8) -> Result<u8, TimeFieldError> {
    if value > component.max_value() {
        return Err(TimeFieldError::OutOfRange { component, value });
    }
    Ok(value)
}

/// Hour and minute without date or timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// `00:00`, also the sentinel value for absent stored pairs.
    pub const MIDNIGHT: TimeOfDay = TimeOfDay { hour: 0, minute: 0 };

    pub fn new(hour: u8, minute: u8) -> Result<Self, TimeFieldError> {
        Ok(Self {
            hour: check_component(TimeComponent::Hour, hour)?,
            minute: check_component(TimeComponent::Minute, minute)?,
        })
    }

    /// Builds a value from hour and minute text fields.
    pub fn from_fields(hour: &str, minute: &str) -> Result<Self, TimeFieldError> {
        Ok(Self {
            hour: parse_time_component(TimeComponent::Hour, hour)?,
            minute: parse_time_component(TimeComponent::Minute, minute)?,
        })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn minute_of_day(&self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }

    /// `HH-MM`, the per-endpoint fragment of a `dayTime` entry.
    pub fn wire_form(&self) -> String {
        format!("{:02}-{:02}", self.hour, self.minute)
    }

    pub fn is_second_half(&self) -> bool {
        self.hour >= SECOND_HALF_START_HOUR
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Complete, ordered time slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSlot {
    from: TimeOfDay,
    to: TimeOfDay,
    /// Patients admitted in the slot; meaningful only for SEQUENCE schedules.
    pub capacity: Option<u32>,
}

impl TimeSlot {
    /// Returns `None` unless `from < to`.
    pub fn new(from: TimeOfDay, to: TimeOfDay) -> Option<Self> {
        if from.minute_of_day() >= to.minute_of_day() {
            return None;
        }
        Some(Self {
            from,
            to,
            capacity: None,
        })
    }

    pub fn with_capacity(mut self, capacity: Option<u32>) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn start(&self) -> TimeOfDay {
        self.from
    }

    pub fn end(&self) -> TimeOfDay {
        self.to
    }

    /// Minute-interval intersection test; touching edges do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.from.minute_of_day() < other.to.minute_of_day()
            && self.to.minute_of_day() > other.from.minute_of_day()
    }

    /// Whether the slot starts in the half of the day owned by slot `index`.
    pub fn starts_in_half_of(&self, index: usize) -> bool {
        match index {
            0 => !self.from.is_second_half(),
            _ => self.from.is_second_half(),
        }
    }
}

/// One of the four editable time fields of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotField {
    FromHour,
    FromMinute,
    ToHour,
    ToMinute,
}

impl SlotField {
    fn component(self) -> TimeComponent {
        match self {
            Self::FromHour | Self::ToHour => TimeComponent::Hour,
            Self::FromMinute | Self::ToMinute => TimeComponent::Minute,
        }
    }
}

/// How many of a slot input's time fields are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotFill {
    Empty,
    Partial,
    Complete,
}

/// Editable slot as typed by the user; may be empty or partial.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotInput {
    from_hour: Option<u8>,
    from_minute: Option<u8>,
    to_hour: Option<u8>,
    to_minute: Option<u8>,
    /// Patient count for SEQUENCE schedules.
    pub capacity: Option<u32>,
}

impl SlotInput {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fully filled input from two endpoints; ordering is not checked here.
    pub fn from_endpoints(from: TimeOfDay, to: TimeOfDay) -> Self {
        Self {
            from_hour: Some(from.hour()),
            from_minute: Some(from.minute()),
            to_hour: Some(to.hour()),
            to_minute: Some(to.minute()),
            capacity: None,
        }
    }

    pub fn with_capacity(mut self, capacity: Option<u32>) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets one field from text. Blank text clears the field.
    pub fn set_field(&mut self, field: SlotField, text: &str) -> Result<(), TimeFieldError> {
        let value = if text.trim().is_empty() {
            None
        } else {
            Some(parse_time_component(field.component(), text)?)
        };
        *self.field_mut(field) = value;
        Ok(())
    }

    pub fn field(&self, field: SlotField) -> Option<u8> {
        match field {
            SlotField::FromHour => self.from_hour,
            SlotField::FromMinute => self.from_minute,
            SlotField::ToHour => self.to_hour,
            SlotField::ToMinute => self.to_minute,
        }
    }

    fn field_mut(&mut self, field: SlotField) -> &mut Option<u8> {
        match field {
            SlotField::FromHour => &mut self.from_hour,
            SlotField::FromMinute => &mut self.from_minute,
            SlotField::ToHour => &mut self.to_hour,
            SlotField::ToMinute => &mut self.to_minute,
        }
    }

    pub fn fill(&self) -> SlotFill {
        let filled = [
            self.from_hour,
            self.from_minute,
            self.to_hour,
            self.to_minute,
        ]
        .iter()
        .filter(|value| value.is_some())
        .count();
        match filled {
            0 => SlotFill::Empty,
            4 => SlotFill::Complete,
            _ => SlotFill::Partial,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.fill() == SlotFill::Complete
    }

    /// `(from, to)` when all four fields are filled, in whatever order they were typed.
    pub fn endpoints(&self) -> Option<(TimeOfDay, TimeOfDay)> {
        let from = TimeOfDay::new(self.from_hour?, self.from_minute?).ok()?;
        let to = TimeOfDay::new(self.to_hour?, self.to_minute?).ok()?;
        Some((from, to))
    }

    /// The slot as an ordered `TimeSlot`, if complete and `from < to`.
    pub fn to_time_slot(&self) -> Option<TimeSlot> {
        let (from, to) = self.endpoints()?;
        TimeSlot::new(from, to).map(|slot| slot.with_capacity(self.capacity))
    }
}

impl From<TimeSlot> for SlotInput {
    fn from(value: TimeSlot) -> Self {
        Self::from_endpoints(value.from, value.to).with_capacity(value.capacity)
    }
}
