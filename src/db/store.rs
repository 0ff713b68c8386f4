use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use super::Session;
use crate::error::Result;
use crate::models::{
    AllocationMode, Booking, BookingStatus, Business, ClockTime, Customer, DayWindow,
    OperatingHoursPeriod, ResourceType, ResourceUsage, RuleKind, Service, Staff,
    StaffAvailabilityRule, TimeSlot,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Whose bookings an overlap check runs against
#[derive(Debug, Clone, Copy)]
pub enum ConflictScope<'a> {
    Business(&'a str),
    Staff(&'a str),
    Customer(&'a str),
}

impl ConflictScope<'_> {
    fn column(&self) -> &'static str {
        match self {
            ConflictScope::Business(_) => "b.business_id",
            ConflictScope::Staff(_) => "b.staff_id",
            ConflictScope::Customer(_) => "b.customer_id",
        }
    }

    fn id(&self) -> &str {
        match self {
            ConflictScope::Business(id) | ConflictScope::Staff(id) | ConflictScope::Customer(id) => id,
        }
    }
}

/// Read/write boundary between the engine and persisted schedule data.
///
/// Reads are advisory outside a write transaction. Writes must only be
/// issued from a session opened by `Database::write`, after re-checking
/// availability through the same session.
pub trait ScheduleStore {
    fn business(&self, id: &str) -> Result<Option<Business>>;

    fn service(&self, id: &str) -> Result<Option<Service>>;

    fn staff_member(&self, id: &str) -> Result<Option<Staff>>;

    fn customer(&self, id: &str) -> Result<Option<Customer>>;

    fn resource_type(&self, id: &str) -> Result<Option<ResourceType>>;

    fn staff_provides_service(&self, staff_id: &str, service_id: &str) -> Result<bool>;

    /// Operating-hour periods for one ISO day of week
    fn operating_hours(&self, business_id: &str, day_of_week: u8)
        -> Result<Vec<OperatingHoursPeriod>>;

    /// Schedule rules for `day_of_week` plus exception rules for `date`
    fn staff_rules(
        &self,
        staff_id: &str,
        day_of_week: u8,
        date: NaiveDate,
    ) -> Result<Vec<StaffAvailabilityRule>>;

    /// Units of a resource type held by active bookings overlapping `span`
    fn reserved_quantity(
        &self,
        resource_type_id: &str,
        span: &TimeSlot,
        exclude_booking: Option<&str>,
    ) -> Result<u32>;

    /// Active bookings in `scope` overlapping `span`
    fn conflicting_bookings(
        &self,
        scope: ConflictScope<'_>,
        span: &TimeSlot,
        exclude_booking: Option<&str>,
    ) -> Result<Vec<Booking>>;

    fn booking(&self, id: &str) -> Result<Option<Booking>>;

    /// Insert a booking together with its resource usage, if any
    fn insert_booking(&self, booking: &Booking) -> Result<()>;

    /// Persist start time, staff, status and notes of an existing booking
    fn update_booking(&self, booking: &Booking) -> Result<()>;
}

// Bookings join their service so the interval end always follows the
// service's current duration.
const BOOKING_SELECT: &str = "
    SELECT b.id, b.customer_id, b.business_id, b.service_id, b.staff_id, b.start_at,
           s.duration_minutes, b.status, u.resource_type_id, u.quantity, b.notes,
           b.created_at, b.updated_at
    FROM bookings b
    JOIN services s ON s.id = b.service_id
    LEFT JOIN resource_usages u ON u.booking_id = b.id";

fn conversion_error(idx: usize, ty: Type, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, msg.into())
}

fn clock_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<ClockTime> {
    let secs: i64 = row.get(idx)?;
    u32::try_from(secs)
        .ok()
        .and_then(ClockTime::from_seconds)
        .ok_or_else(|| conversion_error(idx, Type::Integer, format!("invalid time of day: {secs}")))
}

fn instant_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let secs: i64 = row.get(idx)?;
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| conversion_error(idx, Type::Integer, format!("invalid timestamp: {secs}")))
}

fn booking_from_row(row: &Row<'_>) -> rusqlite::Result<Booking> {
    let start = instant_at(row, 5)?;
    let duration_minutes: i64 = row.get(6)?;
    let status: String = row.get(7)?;
    let status = BookingStatus::parse(&status)
        .ok_or_else(|| conversion_error(7, Type::Text, format!("unknown booking status: {status}")))?;
    let usage_type: Option<String> = row.get(8)?;
    let usage_quantity: Option<u32> = row.get(9)?;

    Ok(Booking {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        business_id: row.get(2)?,
        service_id: row.get(3)?,
        staff_id: row.get(4)?,
        start,
        end: start + chrono::Duration::minutes(duration_minutes),
        status,
        resource_usage: match (usage_type, usage_quantity) {
            (Some(resource_type_id), Some(quantity)) => Some(ResourceUsage {
                resource_type_id,
                quantity,
            }),
            _ => None,
        },
        notes: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl ScheduleStore for Session<'_> {
    fn business(&self, id: &str) -> Result<Option<Business>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, allocation_mode, time_zone FROM businesses WHERE id = ?1")?;

        let business = stmt
            .query_row(params![id], |row| {
                let mode: String = row.get(2)?;
                Ok(Business {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    allocation_mode: AllocationMode::parse(&mode).ok_or_else(|| {
                        conversion_error(2, Type::Text, format!("unknown allocation mode: {mode}"))
                    })?,
                    time_zone: row.get(3)?,
                })
            })
            .optional()?;
        Ok(business)
    }

    fn service(&self, id: &str) -> Result<Option<Service>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, business_id, name, duration_minutes FROM services WHERE id = ?1",
        )?;
        let service = stmt
            .query_row(params![id], |row| {
                Ok(Service {
                    id: row.get(0)?,
                    business_id: row.get(1)?,
                    name: row.get(2)?,
                    duration_minutes: row.get(3)?,
                    required_resource_types: Vec::new(),
                })
            })
            .optional()?;

        let Some(mut service) = service else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT resource_type_id FROM service_resource_types
             WHERE service_id = ?1 ORDER BY resource_type_id",
        )?;
        service.required_resource_types = stmt
            .query_map(params![id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(Some(service))
    }

    fn staff_member(&self, id: &str) -> Result<Option<Staff>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, business_id, name FROM staff WHERE id = ?1")?;
        let staff = stmt
            .query_row(params![id], |row| {
                Ok(Staff {
                    id: row.get(0)?,
                    business_id: row.get(1)?,
                    name: row.get(2)?,
                })
            })
            .optional()?;
        Ok(staff)
    }

    fn customer(&self, id: &str) -> Result<Option<Customer>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email FROM customers WHERE id = ?1")?;
        let customer = stmt
            .query_row(params![id], |row| {
                Ok(Customer {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                })
            })
            .optional()?;
        Ok(customer)
    }

    fn resource_type(&self, id: &str) -> Result<Option<ResourceType>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, business_id, name, total_capacity FROM resource_types WHERE id = ?1",
        )?;
        let resource_type = stmt
            .query_row(params![id], |row| {
                Ok(ResourceType {
                    id: row.get(0)?,
                    business_id: row.get(1)?,
                    name: row.get(2)?,
                    total_capacity: row.get(3)?,
                })
            })
            .optional()?;
        Ok(resource_type)
    }

    fn staff_provides_service(&self, staff_id: &str, service_id: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM staff_services WHERE staff_id = ?1 AND service_id = ?2")?;
        Ok(stmt.exists(params![staff_id, service_id])?)
    }

    fn operating_hours(
        &self,
        business_id: &str,
        day_of_week: u8,
    ) -> Result<Vec<OperatingHoursPeriod>> {
        let mut stmt = self.conn.prepare(
            "SELECT business_id, day_of_week, start_second, end_second
             FROM operating_hours
             WHERE business_id = ?1 AND day_of_week = ?2
             ORDER BY start_second",
        )?;

        let periods = stmt.query_map(params![business_id, day_of_week], |row| {
            Ok(OperatingHoursPeriod {
                business_id: row.get(0)?,
                day_of_week: row.get(1)?,
                window: DayWindow::new(clock_at(row, 2)?, clock_at(row, 3)?),
            })
        })?;

        Ok(periods.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn staff_rules(
        &self,
        staff_id: &str,
        day_of_week: u8,
        date: NaiveDate,
    ) -> Result<Vec<StaffAvailabilityRule>> {
        let mut stmt = self.conn.prepare(
            "SELECT staff_id, kind, day_of_week, rule_date, start_second, end_second
             FROM staff_rules
             WHERE staff_id = ?1
               AND ((kind = 'schedule' AND day_of_week = ?2)
                 OR (kind = 'exception' AND rule_date = ?3))
             ORDER BY start_second",
        )?;

        let date_key = date.format(DATE_FORMAT).to_string();
        let rules = stmt.query_map(params![staff_id, day_of_week, date_key], |row| {
            let kind: String = row.get(1)?;
            let kind = match kind.as_str() {
                "schedule" => RuleKind::Schedule {
                    day_of_week: row.get(2)?,
                },
                _ => {
                    let raw: String = row.get(3)?;
                    let date = NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| {
                        conversion_error(3, Type::Text, format!("invalid rule date {raw}: {e}"))
                    })?;
                    RuleKind::Exception { date }
                }
            };
            Ok(StaffAvailabilityRule {
                staff_id: row.get(0)?,
                kind,
                window: DayWindow::new(clock_at(row, 4)?, clock_at(row, 5)?),
            })
        })?;

        Ok(rules.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn reserved_quantity(
        &self,
        resource_type_id: &str,
        span: &TimeSlot,
        exclude_booking: Option<&str>,
    ) -> Result<u32> {
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(SUM(u.quantity), 0)
             FROM resource_usages u
             JOIN bookings b ON b.id = u.booking_id
             JOIN services s ON s.id = b.service_id
             WHERE u.resource_type_id = ?1
               AND b.status != 'cancelled'
               AND b.start_at < ?3
               AND b.start_at + s.duration_minutes * 60 > ?2
               AND (?4 IS NULL OR b.id != ?4)",
        )?;

        let used: i64 = stmt.query_row(
            params![
                resource_type_id,
                span.start.timestamp(),
                span.end.timestamp(),
                exclude_booking
            ],
            |row| row.get(0),
        )?;
        Ok(u32::try_from(used).unwrap_or(u32::MAX))
    }

    fn conflicting_bookings(
        &self,
        scope: ConflictScope<'_>,
        span: &TimeSlot,
        exclude_booking: Option<&str>,
    ) -> Result<Vec<Booking>> {
        let sql = format!(
            "{BOOKING_SELECT}
             WHERE {} = ?1
               AND b.status != 'cancelled'
               AND b.start_at < ?3
               AND b.start_at + s.duration_minutes * 60 > ?2
               AND (?4 IS NULL OR b.id != ?4)
             ORDER BY b.start_at",
            scope.column()
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let bookings = stmt.query_map(
            params![
                scope.id(),
                span.start.timestamp(),
                span.end.timestamp(),
                exclude_booking
            ],
            booking_from_row,
        )?;

        Ok(bookings.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn booking(&self, id: &str) -> Result<Option<Booking>> {
        let sql = format!("{BOOKING_SELECT} WHERE b.id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt.query_row(params![id], booking_from_row).optional()?)
    }

    fn insert_booking(&self, booking: &Booking) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO bookings (id, customer_id, business_id, service_id, staff_id,
                                  start_at, status, notes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                booking.id,
                booking.customer_id,
                booking.business_id,
                booking.service_id,
                booking.staff_id,
                booking.start.timestamp(),
                booking.status.as_str(),
                booking.notes,
                booking.created_at,
                booking.updated_at,
            ],
        )?;

        if let Some(usage) = &booking.resource_usage {
            self.conn.execute(
                "INSERT INTO resource_usages (booking_id, resource_type_id, quantity)
                 VALUES (?1, ?2, ?3)",
                params![booking.id, usage.resource_type_id, usage.quantity],
            )?;
        }
        Ok(())
    }

    fn update_booking(&self, booking: &Booking) -> Result<()> {
        self.conn.execute(
            "UPDATE bookings
             SET staff_id = ?1, start_at = ?2, status = ?3, notes = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                booking.staff_id,
                booking.start.timestamp(),
                booking.status.as_str(),
                booking.notes,
                booking.updated_at,
                booking.id,
            ],
        )?;
        Ok(())
    }
}
