use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::timeslot::ModeParams;
use crate::error::{BookingError, Result};
use crate::time::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Units of a resource type reserved by one booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub resource_type_id: String,
    pub quantity: u32,
}

/// A booking stored in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub customer_id: String,
    pub business_id: String,
    pub service_id: String,
    pub staff_id: Option<String>,
    pub start: DateTime<Utc>,
    /// Start plus the service duration at read time
    pub end: DateTime<Utc>,
    pub status: BookingStatus,
    pub resource_usage: Option<ResourceUsage>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }
}

/// Booking request as received from a caller, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingBody {
    pub customer_id: String,
    pub business_id: String,
    pub service_id: String,
    pub booking_time: String,
    #[serde(flatten)]
    pub mode: ModeParams,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub prevent_customer_overlap: bool,
}

impl CreateBookingBody {
    pub fn into_request(self, business_zone: Tz) -> Result<BookingRequest> {
        Ok(BookingRequest {
            booking_time: normalize(&self.booking_time, business_zone)?,
            customer_id: self.customer_id,
            business_id: self.business_id,
            service_id: self.service_id,
            mode: self.mode,
            notes: self.notes,
            prevent_customer_overlap: self.prevent_customer_overlap,
        })
    }
}

/// Validated booking request
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub customer_id: String,
    pub business_id: String,
    pub service_id: String,
    pub booking_time: DateTime<Utc>,
    pub mode: ModeParams,
    pub notes: Option<String>,
    pub prevent_customer_overlap: bool,
}

/// Booking changes as received from a caller, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBookingBody {
    #[serde(default)]
    pub booking_time: Option<String>,
    #[serde(default)]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub prevent_customer_overlap: bool,
}

impl UpdateBookingBody {
    pub fn into_update(self, business_zone: Tz) -> Result<BookingUpdate> {
        let booking_time = match self.booking_time.as_deref() {
            Some(raw) => Some(normalize(raw, business_zone)?),
            None => None,
        };
        let status = match self.status.as_deref() {
            Some(raw) => Some(BookingStatus::parse(raw).ok_or_else(|| {
                BookingError::InvalidRequest(format!(
                    "invalid status '{}', use: confirmed, cancelled, or completed",
                    raw
                ))
            })?),
            None => None,
        };

        Ok(BookingUpdate {
            booking_time,
            staff_id: self.staff_id,
            status,
            notes: self.notes,
            prevent_customer_overlap: self.prevent_customer_overlap,
        })
    }
}

/// Validated booking changes; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct BookingUpdate {
    pub booking_time: Option<DateTime<Utc>>,
    pub staff_id: Option<String>,
    pub status: Option<BookingStatus>,
    pub notes: Option<String>,
    pub prevent_customer_overlap: bool,
}

impl BookingUpdate {
    pub fn cancel() -> Self {
        Self {
            status: Some(BookingStatus::Cancelled),
            ..Self::default()
        }
    }
}
