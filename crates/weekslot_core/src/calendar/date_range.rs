//! Inclusive calendar date range and textual date parsing.
//!
//! # Invariants
//! - `start <= end`; reversed ranges are rejected at construction.
//! - Dates carry no time-of-day or timezone.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";
const COMPACT_DATE_FORMAT: &str = "%d.%m.%y";
const STORAGE_DATE_FORMAT: &str = "%Y-%m-%d";

static DISPLAY_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("valid display date regex"));
static COMPACT_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}\.\d{2}\.\d{2}$").expect("valid compact date regex"));

/// Errors raised while parsing or constructing date ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// Endpoint text is neither `DD/MM/YYYY` nor `DD.MM.YY`, or not a real date.
    InvalidDate(String),
    /// `start` falls after `end`.
    ReversedRange { start: NaiveDate, end: NaiveDate },
}

impl Display for CalendarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate(value) => write!(f, "invalid date: `{value}`"),
            Self::ReversedRange { start, end } => write!(
                f,
                "date range start {} is after end {}",
                format_display_date(*start),
                format_display_date(*end)
            ),
        }
    }
}

impl Error for CalendarError {}

/// Parses one calendar date in display (`DD/MM/YYYY`) or compact (`DD.MM.YY`) form.
///
/// Compact years follow chrono's `%y` pivot: `00..=68` map to 20xx.
pub fn parse_calendar_date(value: &str) -> Result<NaiveDate, CalendarError> {
    let trimmed = value.trim();
    let format = if DISPLAY_DATE_RE.is_match(trimmed) {
        DISPLAY_DATE_FORMAT
    } else if COMPACT_DATE_RE.is_match(trimmed) {
        COMPACT_DATE_FORMAT
    } else {
        return Err(CalendarError::InvalidDate(trimmed.to_string()));
    };

    NaiveDate::parse_from_str(trimmed, format)
        .map_err(|_| CalendarError::InvalidDate(trimmed.to_string()))
}

/// Formats a date as `DD/MM/YYYY`.
pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// Formats a date as sortable `YYYY-MM-DD` text.
pub fn format_storage_date(date: NaiveDate) -> String {
    date.format(STORAGE_DATE_FORMAT).to_string()
}

/// Parses sortable `YYYY-MM-DD` text.
pub fn parse_storage_date(value: &str) -> Result<NaiveDate, CalendarError> {
    NaiveDate::parse_from_str(value.trim(), STORAGE_DATE_FORMAT)
        .map_err(|_| CalendarError::InvalidDate(value.trim().to_string()))
}

/// Inclusive `[start, end]` range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CalendarError> {
        if start > end {
            return Err(CalendarError::ReversedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses both endpoints, accepting either supported text form for each.
    pub fn parse(start: &str, end: &str) -> Result<Self, CalendarError> {
        let start = parse_calendar_date(start)?;
        let end = parse_calendar_date(end)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days covered, counting both endpoints.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Returns whether `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Returns whether the two ranges share at least one day.
    pub fn intersects(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Iterates every date from `start` to `end` inclusive.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |date| *date <= end)
    }

    /// `(start, end)` in `DD/MM/YYYY` form, as expected by the backend.
    pub fn display_bounds(&self) -> (String, String) {
        (
            format_display_date(self.start),
            format_display_date(self.end),
        )
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (start, end) = self.display_bounds();
        write!(f, "{start}..{end}")
    }
}
