use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};
use crate::time::{normalize, parse_zone};

/// A time slot representing a period of time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSlot {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Strict overlap: touching endpoints do not overlap
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// A bookable slot, in UTC and in the caller's display zone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub local_start: String,
    pub local_end: String,
}

/// Mode-specific requirements for a slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeParams {
    #[serde(default)]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub resource_type_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// Availability query as received from a caller, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub business_id: String,
    pub service_id: String,
    pub window_start: String,
    pub window_end: String,
    #[serde(default)]
    pub interval_minutes: Option<u32>,
    #[serde(flatten)]
    pub mode: ModeParams,
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Display zone for results; the business zone when absent
    #[serde(default)]
    pub timezone: Option<String>,
}

impl AvailabilityQuery {
    /// Validate the query. Naive timestamps are read in `business_zone`.
    pub fn into_request(
        self,
        business_zone: Tz,
        default_interval: u32,
    ) -> Result<AvailabilityRequest> {
        let display_zone = match self.timezone.as_deref() {
            Some(name) => Some(parse_zone(name)?),
            None => None,
        };
        let window = TimeSlot::new(
            normalize(&self.window_start, business_zone)?,
            normalize(&self.window_end, business_zone)?,
        );
        if window.start >= window.end {
            return Err(BookingError::InvalidRequest(
                "window_start must be before window_end".to_string(),
            ));
        }

        let interval_minutes = self.interval_minutes.unwrap_or(default_interval);
        if !(1..=1440).contains(&interval_minutes) {
            return Err(BookingError::InvalidRequest(format!(
                "interval_minutes must be between 1 and 1440, got {}",
                interval_minutes
            )));
        }

        Ok(AvailabilityRequest {
            business_id: self.business_id,
            service_id: self.service_id,
            window,
            interval_minutes,
            mode: self.mode,
            customer_id: self.customer_id,
            display_zone,
        })
    }
}

/// Validated availability request
#[derive(Debug, Clone)]
pub struct AvailabilityRequest {
    pub business_id: String,
    pub service_id: String,
    pub window: TimeSlot,
    pub interval_minutes: u32,
    pub mode: ModeParams,
    /// Exclude slots overlapping this customer's other bookings
    pub customer_id: Option<String>,
    pub display_zone: Option<Tz>,
}

/// Response for availability query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub slots: Vec<AvailableSlot>,
}
