use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::{BookingError, Result};
use crate::models::{iso_weekday, ClockTime, SECONDS_PER_DAY};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse an IANA zone name such as "Europe/Berlin"
pub fn parse_zone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| BookingError::InvalidRequest(format!("unknown time zone: {}", name)))
}

/// Resolve an optional stored zone, falling back to UTC
pub fn zone_or_utc(name: Option<&str>) -> Result<Tz> {
    match name {
        Some(n) if !n.trim().is_empty() => parse_zone(n),
        _ => Ok(Tz::UTC),
    }
}

/// Convert a timestamp string to a UTC instant.
///
/// RFC 3339 input keeps its own offset. Input without an offset is read as
/// wall-clock time in `context`.
pub fn normalize(raw: &str, context: Tz) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return context
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| {
                    BookingError::InvalidTimeFormat(format!(
                        "{} does not exist in {}",
                        raw,
                        context.name()
                    ))
                });
        }
    }

    Err(BookingError::InvalidTimeFormat(format!(
        "{} (expected RFC 3339 or YYYY-MM-DDTHH:MM[:SS])",
        raw
    )))
}

/// Render a UTC instant as RFC 3339 in the given zone
pub fn to_display_zone(instant: DateTime<Utc>, zone: Tz) -> String {
    instant.with_timezone(&zone).to_rfc3339()
}

/// A candidate interval projected onto one local calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalSpan {
    pub date: NaiveDate,
    pub day_of_week: u8,
    pub start: ClockTime,
    pub end: ClockTime,
}

/// Project `[start, end)` onto the local day of `start` in `zone`.
///
/// Returns `None` when the interval runs past the next local midnight, or
/// crosses a UTC offset change, since no single-day window can cover it.
pub fn local_span(zone: Tz, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<LocalSpan> {
    let local_start = start.with_timezone(&zone);
    let local_end = end.with_timezone(&zone);
    let date = local_start.date_naive();
    if local_start.offset().fix() != local_end.offset().fix() {
        return None;
    }

    let start_secs = local_start.num_seconds_from_midnight();
    let end_secs = if local_end.date_naive() == date {
        local_end.num_seconds_from_midnight()
    } else if local_end.date_naive() == date.succ_opt()? && local_end.num_seconds_from_midnight() == 0 {
        SECONDS_PER_DAY
    } else {
        return None;
    };
    if end_secs < start_secs {
        return None;
    }

    Some(LocalSpan {
        date,
        day_of_week: iso_weekday(date.weekday()),
        start: ClockTime::from_seconds(start_secs)?,
        end: ClockTime::from_seconds(end_secs)?,
    })
}
