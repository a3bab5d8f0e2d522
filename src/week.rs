use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// ISO-8601 week identifier, rendered as `YYYY-Www`.
///
/// Ordering is chronological: year first, then week number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekKey {
    year: i32,
    week: u32,
}

impl WeekKey {
    pub const FIRST: WeekKey = WeekKey { year: 0, week: 1 };
    // 9999 starts on a Friday and is not a leap year, so it has 52 weeks.
    pub const LAST: WeekKey = WeekKey {
        year: 9999,
        week: 52,
    };

    pub fn new(year: i32, week: u32) -> Option<Self> {
        if (1..=53).contains(&week) && (0..=9999).contains(&year) {
            Some(Self { year, week })
        } else {
            None
        }
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year, self.week)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWeekKeyError(String);

impl fmt::Display for ParseWeekKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid week key `{}` (expected YYYY-Www)", self.0)
    }
}

impl std::error::Error for ParseWeekKeyError {}

impl FromStr for WeekKey {
    type Err = ParseWeekKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseWeekKeyError(s.to_string());
        let (year, week) = s.split_once("-W").ok_or_else(err)?;
        if year.len() != 4 || week.len() != 2 {
            return Err(err());
        }
        if !year.bytes().chain(week.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let year = year.parse().map_err(|_| err())?;
        let week = week.parse().map_err(|_| err())?;
        WeekKey::new(year, week).ok_or_else(err)
    }
}

impl Serialize for WeekKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Week containing `date`, using Monday-start weeks owned by the year of
/// their Thursday. Keys cover ISO years 0000 through 9999; dates outside that
/// range clamp to the first or last representable week.
pub fn week_key_for(date: NaiveDate) -> WeekKey {
    let iso = date.iso_week();
    match iso.year() {
        year if year < 0 => WeekKey::FIRST,
        year if year > 9999 => WeekKey::LAST,
        year => WeekKey {
            year,
            week: iso.week(),
        },
    }
}

/// Week containing `now`, with the calendar date taken in `now`'s own timezone.
pub fn current_week_key<Tz: TimeZone>(now: &DateTime<Tz>) -> WeekKey {
    week_key_for(now.date_naive())
}
