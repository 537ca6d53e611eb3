//! The fixed weekly grid — five weekdays by five teaching periods.
//!
//! The grid is process-wide configuration, not per-request: every timetable
//! in the store shares the same day and period axes, so slots from different
//! timetables are directly comparable (faculty double-booking is checked
//! across timetables).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Teaching days, Monday through Friday. Serialized as the full English name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The five fixed teaching periods. Serialized as the literal clock ranges
/// the front-end sends and displays.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Period {
    #[serde(rename = "8:45am - 9:30am")]
    First,
    #[serde(rename = "9:30am - 10:15am")]
    Second,
    #[serde(rename = "10:15am - 11:00am")]
    Third,
    #[serde(rename = "11:30am - 12:15pm")]
    Fourth,
    #[serde(rename = "12:15pm - 1:00pm")]
    Fifth,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::First,
        Period::Second,
        Period::Third,
        Period::Fourth,
        Period::Fifth,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::First => "8:45am - 9:30am",
            Period::Second => "9:30am - 10:15am",
            Period::Third => "10:15am - 11:00am",
            Period::Fourth => "11:30am - 12:15pm",
            Period::Fifth => "12:15pm - 1:00pm",
        }
    }

    /// The period immediately after this one on the same day, if any.
    /// Lab double-blocks occupy a period and its successor.
    pub fn next(self) -> Option<Period> {
        Period::ALL.get(self.index() + 1).copied()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub const DAYS_PER_WEEK: usize = Weekday::ALL.len();
pub const PERIODS_PER_DAY: usize = Period::ALL.len();
pub const SLOTS_PER_WEEK: usize = DAYS_PER_WEEK * PERIODS_PER_DAY;

/// A (day, period) cell in the weekly grid.
///
/// `Ord` is day-major chronological order (Monday first period < Monday
/// second period < ... < Friday fifth period); the field order of the derive
/// is relied upon for that.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Slot {
    pub day: Weekday,
    pub period: Period,
}

impl Slot {
    pub fn new(day: Weekday, period: Period) -> Self {
        Slot { day, period }
    }

    /// Chronological position of this slot within the week, 0-based.
    pub fn ordinal(self) -> usize {
        self.day.index() * PERIODS_PER_DAY + self.period.index()
    }

    /// All slots of the week in chronological order.
    pub fn all() -> impl Iterator<Item = Slot> {
        Weekday::ALL.into_iter().flat_map(|day| {
            Period::ALL
                .into_iter()
                .map(move |period| Slot { day, period })
        })
    }

    /// The slot occupying the next period of the same day, if any.
    pub fn next_in_day(self) -> Option<Slot> {
        self.period.next().map(|period| Slot {
            day: self.day,
            period,
        })
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_ordinals_are_chronological_and_dense() {
        let ordinals: Vec<usize> = Slot::all().map(Slot::ordinal).collect();
        assert_eq!(ordinals, (0..SLOTS_PER_WEEK).collect::<Vec<_>>());
    }

    #[test]
    fn test_slot_ord_matches_ordinal() {
        let slots: Vec<Slot> = Slot::all().collect();
        let mut sorted = slots.clone();
        sorted.sort();
        assert_eq!(slots, sorted);
    }

    #[test]
    fn test_period_serializes_as_clock_range() {
        let json = serde_json::to_string(&Period::Fourth).unwrap();
        assert_eq!(json, "\"11:30am - 12:15pm\"");
        let back: Period = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Period::Fourth);
    }

    #[test]
    fn test_weekday_serializes_as_full_name() {
        let json = serde_json::to_string(&Weekday::Wednesday).unwrap();
        assert_eq!(json, "\"Wednesday\"");
    }

    #[test]
    fn test_next_in_day_stops_at_last_period() {
        let last = Slot::new(Weekday::Monday, Period::Fifth);
        assert_eq!(last.next_in_day(), None);
        let fourth = Slot::new(Weekday::Monday, Period::Fourth);
        assert_eq!(fourth.next_in_day(), Some(last));
    }
}
