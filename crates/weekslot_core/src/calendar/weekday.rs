//! Weekday enumeration used as lookup key and selection member.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// ISO weekday. Declaration order is the canonical wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All weekdays in canonical order.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Full English name as used by `checkedDay`.
    pub fn full_name(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    /// Zero-based position in canonical order (Monday = 0).
    pub fn index(self) -> usize {
        match self {
            Self::Monday => 0,
            Self::Tuesday => 1,
            Self::Wednesday => 2,
            Self::Thursday => 3,
            Self::Friday => 4,
            Self::Saturday => 5,
            Self::Sunday => 6,
        }
    }

    /// Parses a full or three-letter weekday name, case-insensitively.
    pub fn parse_name(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|day| {
            let full = day.full_name().to_ascii_lowercase();
            normalized == full || (normalized.len() == 3 && full.starts_with(&normalized))
        })
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(value: chrono::Weekday) -> Self {
        match value {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

impl Display for Weekday {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::Weekday;

    #[test]
    fn parse_name_accepts_full_and_short_forms() {
        assert_eq!(Weekday::parse_name("monday"), Some(Weekday::Monday));
        assert_eq!(Weekday::parse_name(" Friday "), Some(Weekday::Friday));
        assert_eq!(Weekday::parse_name("SAT"), Some(Weekday::Saturday));
        assert_eq!(Weekday::parse_name("Mo"), None);
        assert_eq!(Weekday::parse_name("Funday"), None);
    }

    #[test]
    fn canonical_order_starts_on_monday() {
        let mut days = vec![Weekday::Sunday, Weekday::Wednesday, Weekday::Monday];
        days.sort();
        assert_eq!(
            days,
            vec![Weekday::Monday, Weekday::Wednesday, Weekday::Sunday]
        );
        for (position, day) in Weekday::ALL.iter().enumerate() {
            assert_eq!(day.index(), position);
        }
    }

    #[test]
    fn converts_from_chrono_weekday() {
        assert_eq!(Weekday::from(chrono::Weekday::Sun), Weekday::Sunday);
        assert_eq!(Weekday::from(chrono::Weekday::Tue), Weekday::Tuesday);
    }
}
