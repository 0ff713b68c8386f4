use serde::{Deserialize, Serialize};

/// Seconds in a full day; also the latest representable clock time (24:00)
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Clock times at or after 23:59 count as "end of day" for full-day blocks
const END_OF_DAY_THRESHOLD: u32 = 23 * 3600 + 59 * 60;

/// A wall-clock time of day, stored as seconds since local midnight.
///
/// Ranges over `00:00..=24:00` so a window can close at midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u32);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);
    pub const END_OF_DAY: ClockTime = ClockTime(SECONDS_PER_DAY);

    pub fn from_seconds(seconds: u32) -> Option<Self> {
        (seconds <= SECONDS_PER_DAY).then_some(ClockTime(seconds))
    }

    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
        if hour > 24 || minute > 59 || second > 59 {
            return None;
        }
        Self::from_seconds(hour * 3600 + minute * 60 + second)
    }

    pub fn seconds(&self) -> u32 {
        self.0
    }

    /// Parse "HH:MM" or "HH:MM:SS"; "24:00" is accepted
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split(':');
        let hour: u32 = parts.next()?.parse().ok()?;
        let minute: u32 = parts.next()?.parse().ok()?;
        let second: u32 = match parts.next() {
            Some(sec) => sec.parse().ok()?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }
        Self::from_hms(hour, minute, second)
    }

    pub fn is_end_of_day(&self) -> bool {
        self.0 >= END_OF_DAY_THRESHOLD
    }
}

impl std::fmt::Display for ClockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (h, m, s) = (self.0 / 3600, (self.0 % 3600) / 60, self.0 % 60);
        if s == 0 {
            write!(f, "{:02}:{:02}", h, m)
        } else {
            write!(f, "{:02}:{:02}:{:02}", h, m, s)
        }
    }
}

impl TryFrom<String> for ClockTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ClockTime::parse(&value).ok_or_else(|| format!("invalid time of day: {value}"))
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

/// A window within a single local day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl DayWindow {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    /// Check if the window contains `[start, end]`, both boundaries inclusive
    pub fn covers(&self, start: ClockTime, end: ClockTime) -> bool {
        self.start <= start && end <= self.end
    }

    /// A window spanning 00:00 through at least 23:59
    pub fn is_full_day(&self) -> bool {
        self.start == ClockTime::MIDNIGHT && self.end.is_end_of_day()
    }
}

/// ISO day-of-week number, Monday = 1 through Sunday = 7
pub fn iso_weekday(day: chrono::Weekday) -> u8 {
    day.number_from_monday() as u8
}
