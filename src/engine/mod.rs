mod capacity;
mod commit;
mod conflict;
mod hours;
mod plan;
mod resolver;
mod staff;

#[cfg(test)]
pub(crate) mod fixtures;

pub use capacity::has_capacity;
pub use commit::{commit_booking, new_booking_id, update_booking};
pub use conflict::has_conflict;
pub use hours::is_within_hours;
pub use plan::{Rejection, ResourceDemand, SlotPlan};
pub use resolver::{candidate_starts, resolve_availability};
pub use staff::is_staff_available;

use chrono::Utc;
use chrono_tz::Tz;

use crate::config::EngineSettings;
use crate::db::{Database, ScheduleStore};
use crate::error::{BookingError, EntityKind, Result};
use crate::models::{AvailabilityRequest, AvailableSlot, Booking, BookingRequest, BookingUpdate};
use crate::time::zone_or_utc;

/// Look up the zone a business's hours and schedules are written in
pub fn business_time_zone<S: ScheduleStore + ?Sized>(store: &S, business_id: &str) -> Result<Tz> {
    let business = store
        .business(business_id)?
        .ok_or_else(|| BookingError::not_found(EntityKind::Business, business_id))?;
    zone_or_utc(business.time_zone.as_deref())
}

/// Entry point for availability queries and booking writes.
///
/// Holds no state beyond the database handle; every call opens its own
/// session and releases it on return, whatever the outcome.
#[derive(Clone)]
pub struct BookingEngine {
    db: Database,
    settings: EngineSettings,
}

impl BookingEngine {
    pub fn new(db: Database, settings: EngineSettings) -> Self {
        Self { db, settings }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn resolve_business_time_zone(&self, business_id: &str) -> Result<Tz> {
        self.db.read(|s| business_time_zone(s, business_id))
    }

    /// Zone of the business that owns a booking
    pub fn booking_time_zone(&self, booking_id: &str) -> Result<Tz> {
        self.db.read(|s| {
            let booking = s
                .booking(booking_id)?
                .ok_or_else(|| BookingError::not_found(EntityKind::Booking, booking_id))?;
            business_time_zone(s, &booking.business_id)
        })
    }

    /// Bookable slots in the request window. Results are advisory: only a
    /// commit decides whether a slot is still free.
    pub fn resolve_availability(&self, req: &AvailabilityRequest) -> Result<Vec<AvailableSlot>> {
        self.db
            .read(|s| resolve_availability(s, req, self.settings.max_candidates))
    }

    pub fn commit_booking(&self, req: &BookingRequest) -> Result<Booking> {
        self.db.write(|s| commit_booking(s, req, Utc::now()))
    }

    pub fn update_booking(&self, booking_id: &str, update: &BookingUpdate) -> Result<Booking> {
        self.db
            .write(|s| update_booking(s, booking_id, update, Utc::now()))
    }

    pub fn cancel_booking(&self, booking_id: &str) -> Result<Booking> {
        self.update_booking(booking_id, &BookingUpdate::cancel())
    }

    pub fn get_booking(&self, booking_id: &str) -> Result<Booking> {
        self.db.read(|s| {
            s.booking(booking_id)?
                .ok_or_else(|| BookingError::not_found(EntityKind::Booking, booking_id))
        })
    }
}
