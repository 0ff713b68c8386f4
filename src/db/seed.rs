use anyhow::Context;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::Session;
use crate::error::{BookingError, Result};
use crate::models::{AllocationMode, Business, ClockTime};
use crate::time::zone_or_utc;

/// A weekly window: ISO day of week (Monday = 1) plus local start/end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoursSeed {
    pub day: u8,
    pub start: ClockTime,
    pub end: ClockTime,
}

/// A date-specific staff window; 00:00-23:59 blocks the whole date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionSeed {
    pub date: NaiveDate,
    pub start: ClockTime,
    pub end: ClockTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSeed {
    pub id: String,
    pub name: String,
    pub duration_minutes: u32,
    /// Resource types this service draws on
    #[serde(default)]
    pub resource_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffSeed {
    pub id: String,
    pub name: String,
    /// Services this staff member can provide
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub schedule: Vec<HoursSeed>,
    #[serde(default)]
    pub exceptions: Vec<ExceptionSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTypeSeed {
    pub id: String,
    pub name: String,
    pub total_capacity: u32,
    /// Names of concrete instances, informational only
    #[serde(default)]
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A complete business definition, loaded from JSON and validated before
/// anything touches the store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessSeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub allocation_mode: AllocationMode,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub hours: Vec<HoursSeed>,
    #[serde(default)]
    pub services: Vec<ServiceSeed>,
    #[serde(default)]
    pub staff: Vec<StaffSeed>,
    #[serde(default)]
    pub resource_types: Vec<ResourceTypeSeed>,
    #[serde(default)]
    pub customers: Vec<CustomerSeed>,
}

fn invalid(msg: String) -> BookingError {
    BookingError::InvalidRequest(msg)
}

fn check_window(what: &str, start: ClockTime, end: ClockTime) -> Result<()> {
    if start >= end {
        return Err(invalid(format!(
            "{what}: start {start} must be before end {end}"
        )));
    }
    Ok(())
}

fn check_weekly(what: &str, hours: &HoursSeed) -> Result<()> {
    if !(1..=7).contains(&hours.day) {
        return Err(invalid(format!(
            "{what}: day of week must be 1 (Monday) to 7 (Sunday), got {}",
            hours.day
        )));
    }
    check_window(what, hours.start, hours.end)
}

impl BusinessSeed {
    /// Read and validate a seed file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        let seed: BusinessSeed = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse seed file {}", path.display()))?;
        seed.validate()?;
        Ok(seed)
    }

    pub fn business(&self) -> Business {
        Business {
            id: self.id.clone(),
            name: self.name.clone(),
            allocation_mode: self.allocation_mode,
            time_zone: self.time_zone.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(invalid("business id must not be empty".to_string()));
        }
        zone_or_utc(self.time_zone.as_deref())?;

        for hours in &self.hours {
            check_weekly("operating hours", hours)?;
        }

        let resource_types: HashSet<&str> =
            self.resource_types.iter().map(|r| r.id.as_str()).collect();

        let mut services = HashSet::new();
        for service in &self.services {
            if service.duration_minutes == 0 {
                return Err(invalid(format!(
                    "service {}: duration must be positive",
                    service.id
                )));
            }
            if let Some(missing) = service
                .resource_types
                .iter()
                .find(|rt| !resource_types.contains(rt.as_str()))
            {
                return Err(invalid(format!(
                    "service {}: unknown resource type {}",
                    service.id, missing
                )));
            }
            services.insert(service.id.as_str());
        }

        for member in &self.staff {
            if let Some(missing) = member
                .services
                .iter()
                .find(|s| !services.contains(s.as_str()))
            {
                return Err(invalid(format!(
                    "staff {}: unknown service {}",
                    member.id, missing
                )));
            }
            for rule in &member.schedule {
                check_weekly(&format!("staff {} schedule", member.id), rule)?;
            }
            for rule in &member.exceptions {
                check_window(&format!("staff {} exception", member.id), rule.start, rule.end)?;
            }
        }

        Ok(())
    }
}

/// Refuse to take over an id another business already owns
fn check_owner(conn: &Connection, table: &'static str, id: &str, business_id: &str) -> Result<()> {
    let owner: Option<String> = conn
        .query_row(
            &format!("SELECT business_id FROM {table} WHERE id = ?1"),
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    match owner {
        Some(owner) if owner != business_id => Err(invalid(format!(
            "{table} id {id} already belongs to business {owner}"
        ))),
        _ => Ok(()),
    }
}

impl Session<'_> {
    /// Upsert a business and replace its hours, rules and links
    pub fn apply_seed(&self, seed: &BusinessSeed) -> Result<()> {
        let conn = self.conn;
        let business = seed.business();

        for rt in &seed.resource_types {
            check_owner(conn, "resource_types", &rt.id, &business.id)?;
        }
        for service in &seed.services {
            check_owner(conn, "services", &service.id, &business.id)?;
        }
        for member in &seed.staff {
            check_owner(conn, "staff", &member.id, &business.id)?;
        }

        conn.execute(
            "INSERT INTO businesses (id, name, allocation_mode, time_zone)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                allocation_mode = excluded.allocation_mode,
                time_zone = excluded.time_zone",
            params![
                business.id,
                business.name,
                business.allocation_mode.as_str(),
                business.time_zone
            ],
        )?;

        conn.execute(
            "DELETE FROM operating_hours WHERE business_id = ?1",
            params![seed.id],
        )?;
        for hours in &seed.hours {
            conn.execute(
                "INSERT INTO operating_hours (business_id, day_of_week, start_second, end_second)
                 VALUES (?1, ?2, ?3, ?4)",
                params![seed.id, hours.day, hours.start.seconds(), hours.end.seconds()],
            )?;
        }

        for rt in &seed.resource_types {
            conn.execute(
                "INSERT INTO resource_types (id, business_id, name, total_capacity)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    total_capacity = excluded.total_capacity",
                params![rt.id, seed.id, rt.name, rt.total_capacity],
            )?;
            conn.execute(
                "DELETE FROM resources WHERE resource_type_id = ?1",
                params![rt.id],
            )?;
            for (i, name) in rt.resources.iter().enumerate() {
                conn.execute(
                    "INSERT INTO resources (id, resource_type_id, name) VALUES (?1, ?2, ?3)",
                    params![format!("{}-{}", rt.id, i + 1), rt.id, name],
                )?;
            }
        }

        for service in &seed.services {
            conn.execute(
                "INSERT INTO services (id, business_id, name, duration_minutes)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    duration_minutes = excluded.duration_minutes",
                params![service.id, seed.id, service.name, service.duration_minutes],
            )?;
            conn.execute(
                "DELETE FROM service_resource_types WHERE service_id = ?1",
                params![service.id],
            )?;
            for rt in &service.resource_types {
                conn.execute(
                    "INSERT INTO service_resource_types (service_id, resource_type_id)
                     VALUES (?1, ?2)",
                    params![service.id, rt],
                )?;
            }
        }

        for member in &seed.staff {
            conn.execute(
                "INSERT INTO staff (id, business_id, name) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name",
                params![member.id, seed.id, member.name],
            )?;
            conn.execute(
                "DELETE FROM staff_services WHERE staff_id = ?1",
                params![member.id],
            )?;
            for service_id in &member.services {
                conn.execute(
                    "INSERT INTO staff_services (staff_id, service_id) VALUES (?1, ?2)",
                    params![member.id, service_id],
                )?;
            }

            conn.execute(
                "DELETE FROM staff_rules WHERE staff_id = ?1",
                params![member.id],
            )?;
            for rule in &member.schedule {
                conn.execute(
                    "INSERT INTO staff_rules (staff_id, kind, day_of_week, start_second, end_second)
                     VALUES (?1, 'schedule', ?2, ?3, ?4)",
                    params![member.id, rule.day, rule.start.seconds(), rule.end.seconds()],
                )?;
            }
            for rule in &member.exceptions {
                conn.execute(
                    "INSERT INTO staff_rules (staff_id, kind, rule_date, start_second, end_second)
                     VALUES (?1, 'exception', ?2, ?3, ?4)",
                    params![
                        member.id,
                        rule.date.format("%Y-%m-%d").to_string(),
                        rule.start.seconds(),
                        rule.end.seconds()
                    ],
                )?;
            }
        }

        for customer in &seed.customers {
            conn.execute(
                "INSERT INTO customers (id, name, email) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name, email = excluded.email",
                params![customer.id, customer.name, customer.email],
            )?;
        }

        tracing::debug!(
            business = %seed.id,
            services = seed.services.len(),
            staff = seed.staff.len(),
            resource_types = seed.resource_types.len(),
            "applied business seed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, ScheduleStore};

    const SALON_JSON: &str = r#"{
        "id": "salon",
        "name": "Salon Nord",
        "allocation_mode": "staff_only",
        "time_zone": "Europe/Berlin",
        "hours": [
            {"day": 1, "start": "09:00", "end": "12:00"},
            {"day": 1, "start": "13:00", "end": "18:00"}
        ],
        "services": [{"id": "cut", "name": "Haircut", "duration_minutes": 45}],
        "staff": [{
            "id": "mia",
            "name": "Mia",
            "services": ["cut"],
            "schedule": [{"day": 1, "start": "09:00", "end": "18:00"}],
            "exceptions": [{"date": "2026-03-09", "start": "00:00", "end": "23:59"}]
        }],
        "customers": [{"id": "c1", "name": "Chris"}]
    }"#;

    #[test]
    fn test_parse_and_apply_json_seed() {
        let seed: BusinessSeed = serde_json::from_str(SALON_JSON).unwrap();
        seed.validate().unwrap();

        let db = Database::open_in_memory().unwrap();
        db.apply_seed(&seed).unwrap();

        let business = db.read(|s| s.business("salon")).unwrap().unwrap();
        assert_eq!(business.allocation_mode, AllocationMode::StaffOnly);
        assert_eq!(business.time_zone.as_deref(), Some("Europe/Berlin"));
        assert!(db.read(|s| s.staff_provides_service("mia", "cut")).unwrap());
    }

    #[test]
    fn test_reseed_replaces_hours() {
        let mut seed: BusinessSeed = serde_json::from_str(SALON_JSON).unwrap();
        let db = Database::open_in_memory().unwrap();
        db.apply_seed(&seed).unwrap();

        seed.hours.truncate(1);
        db.apply_seed(&seed).unwrap();
        assert_eq!(db.read(|s| s.operating_hours("salon", 1)).unwrap().len(), 1);
    }

    #[test]
    fn test_reseed_refuses_ids_owned_by_another_business() {
        let salon: BusinessSeed = serde_json::from_str(SALON_JSON).unwrap();
        let db = Database::open_in_memory().unwrap();
        db.apply_seed(&salon).unwrap();

        let mut rival = salon.clone();
        rival.id = "rival".to_string();
        rival.staff.clear();
        let err = db.apply_seed(&rival).unwrap_err();
        assert!(matches!(err, BookingError::InvalidRequest(_)));

        // Nothing from the refused seed is kept
        assert!(db.read(|s| s.business("rival")).unwrap().is_none());
        let cut = db.read(|s| s.service("cut")).unwrap().unwrap();
        assert_eq!(cut.business_id, "salon");
    }

    #[test]
    fn test_validation_rejects_bad_definitions() {
        let base: BusinessSeed = serde_json::from_str(SALON_JSON).unwrap();

        let mut seed = base.clone();
        seed.hours[0].day = 8;
        assert!(seed.validate().is_err());

        let mut seed = base.clone();
        seed.hours[0].end = seed.hours[0].start;
        assert!(seed.validate().is_err());

        let mut seed = base.clone();
        seed.services[0].duration_minutes = 0;
        assert!(seed.validate().is_err());

        let mut seed = base.clone();
        seed.staff[0].services.push("massage".to_string());
        assert!(seed.validate().is_err());

        let mut seed = base.clone();
        seed.services[0].resource_types.push("chair".to_string());
        assert!(seed.validate().is_err());

        let mut seed = base;
        seed.time_zone = Some("Atlantis/Central".to_string());
        assert!(seed.validate().is_err());
    }

    #[test]
    fn test_from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = BusinessSeed::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
