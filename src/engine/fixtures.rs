//! Shared test fixtures: a small studio open Mondays 09:00-17:00 UTC.

use chrono::{DateTime, Utc};

use super::BookingEngine;
use crate::config::EngineSettings;
use crate::db::{
    BusinessSeed, CustomerSeed, Database, HoursSeed, ResourceTypeSeed, ServiceSeed, StaffSeed,
};
use crate::models::{
    AllocationMode, AvailabilityRequest, BookingRequest, ClockTime, ModeParams, TimeSlot,
};

/// 2026-03-02 is a Monday
pub const MONDAY: &str = "2026-03-02";

pub fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

/// Monday at "HH:MM" UTC
pub fn at(time: &str) -> DateTime<Utc> {
    utc(&format!("{MONDAY}T{time}:00Z"))
}

pub fn span(start: &str, end: &str) -> TimeSlot {
    TimeSlot::new(at(start), at(end))
}

pub fn weekly(day: u8, start: &str, end: &str) -> HoursSeed {
    HoursSeed {
        day,
        start: ClockTime::parse(start).unwrap(),
        end: ClockTime::parse(end).unwrap(),
    }
}

/// Services: `consult` (30 min, draws on `room`) and `workshop` (60 min).
/// Staff: `ana` does both, Mondays 09-17; `ben` only workshops, Mondays 12-17.
/// Resource type `room` has capacity 2. Customers `c1`..`c5`.
pub fn studio(mode: AllocationMode) -> BusinessSeed {
    BusinessSeed {
        id: "biz".to_string(),
        name: "Studio".to_string(),
        allocation_mode: mode,
        time_zone: None,
        hours: vec![weekly(1, "09:00", "17:00")],
        services: vec![
            ServiceSeed {
                id: "consult".to_string(),
                name: "Consultation".to_string(),
                duration_minutes: 30,
                resource_types: vec!["room".to_string()],
            },
            ServiceSeed {
                id: "workshop".to_string(),
                name: "Workshop".to_string(),
                duration_minutes: 60,
                resource_types: vec![],
            },
        ],
        staff: vec![
            StaffSeed {
                id: "ana".to_string(),
                name: "Ana".to_string(),
                services: vec!["consult".to_string(), "workshop".to_string()],
                schedule: vec![weekly(1, "09:00", "17:00")],
                exceptions: vec![],
            },
            StaffSeed {
                id: "ben".to_string(),
                name: "Ben".to_string(),
                services: vec!["workshop".to_string()],
                schedule: vec![weekly(1, "12:00", "17:00")],
                exceptions: vec![],
            },
        ],
        resource_types: vec![ResourceTypeSeed {
            id: "room".to_string(),
            name: "Treatment room".to_string(),
            total_capacity: 2,
            resources: vec!["Room A".to_string(), "Room B".to_string()],
        }],
        customers: (1..=5)
            .map(|i| CustomerSeed {
                id: format!("c{i}"),
                name: format!("Customer {i}"),
                email: None,
            })
            .collect(),
    }
}

pub fn database(seed: &BusinessSeed) -> Database {
    let db = Database::open_in_memory().unwrap();
    db.apply_seed(seed).unwrap();
    db
}

pub fn engine(seed: &BusinessSeed) -> BookingEngine {
    BookingEngine::new(database(seed), EngineSettings::default())
}

pub fn staff(id: &str) -> ModeParams {
    ModeParams {
        staff_id: Some(id.to_string()),
        ..ModeParams::default()
    }
}

pub fn query(service: &str, from: &str, to: &str, interval: u32, mode: ModeParams) -> AvailabilityRequest {
    AvailabilityRequest {
        business_id: "biz".to_string(),
        service_id: service.to_string(),
        window: span(from, to),
        interval_minutes: interval,
        mode,
        customer_id: None,
        display_zone: None,
    }
}

pub fn booking(customer: &str, service: &str, start: &str, mode: ModeParams) -> BookingRequest {
    BookingRequest {
        customer_id: customer.to_string(),
        business_id: "biz".to_string(),
        service_id: service.to_string(),
        booking_time: at(start),
        mode,
        notes: None,
        prevent_customer_overlap: false,
    }
}
