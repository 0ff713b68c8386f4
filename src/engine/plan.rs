use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::capacity::has_capacity;
use super::conflict::has_conflict;
use super::hours::is_within_hours;
use super::staff::is_staff_available;
use crate::db::{ConflictScope, ScheduleStore};
use crate::error::{BookingError, EntityKind, Result};
use crate::models::{AllocationMode, Business, ModeParams, ResourceType, Service, TimeSlot};
use crate::time::zone_or_utc;

/// Units of one resource type a slot must reserve
#[derive(Debug, Clone)]
pub struct ResourceDemand {
    pub resource_type: ResourceType,
    pub quantity: u32,
}

/// Why a candidate slot was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    OutsideHours,
    BusinessBusy,
    StaffUnavailable,
    StaffBusy,
    CapacityExhausted,
    CustomerBusy,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::OutsideHours => "outside operating hours",
            Rejection::BusinessBusy => "business already booked",
            Rejection::StaffUnavailable => "staff not scheduled",
            Rejection::StaffBusy => "staff already booked",
            Rejection::CapacityExhausted => "resource capacity exhausted",
            Rejection::CustomerBusy => "customer already booked",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything needed to test candidate slots for one service in one
/// allocation mode, resolved and validated up front.
///
/// Enumeration and commit both go through [`SlotPlan::rejection`], so a
/// slot listed as available passes the same checks at commit time.
#[derive(Debug, Clone)]
pub struct SlotPlan {
    pub business: Business,
    pub zone: Tz,
    pub service: Service,
    pub staff_id: Option<String>,
    pub resource: Option<ResourceDemand>,
    pub customer_id: Option<String>,
    pub exclude_booking: Option<String>,
}

impl SlotPlan {
    /// Resolve the business, service and mode requirements.
    ///
    /// Fails fast on unknown or foreign entities, a staff member who does
    /// not provide the service, missing mode parameters, and quantities no
    /// amount of free capacity could satisfy. Parameters the business's mode
    /// does not use are dropped.
    pub fn prepare<S: ScheduleStore + ?Sized>(
        store: &S,
        business_id: &str,
        service_id: &str,
        params: &ModeParams,
    ) -> Result<Self> {
        let business = store
            .business(business_id)?
            .ok_or_else(|| BookingError::not_found(EntityKind::Business, business_id))?;
        let zone = zone_or_utc(business.time_zone.as_deref())?;

        let service = store
            .service(service_id)?
            .filter(|s| s.business_id == business.id)
            .ok_or_else(|| BookingError::not_found(EntityKind::Service, service_id))?;

        let mode = business.allocation_mode;
        let staff_id = if mode.requires_staff() {
            Some(resolve_staff(store, &business, &service, params)?)
        } else {
            None
        };
        let resource = if mode.requires_resource() {
            Some(resolve_resource(store, &business, &service, params)?)
        } else {
            None
        };

        tracing::debug!(
            business = %business.id,
            service = %service.id,
            %mode,
            staff = ?staff_id,
            resource = ?resource.as_ref().map(|r| (&r.resource_type.id, r.quantity)),
            "prepared slot plan"
        );

        Ok(Self {
            business,
            zone,
            service,
            staff_id,
            resource,
            customer_id: None,
            exclude_booking: None,
        })
    }

    /// Also reject slots overlapping this customer's bookings
    pub fn with_customer(mut self, customer_id: Option<String>) -> Self {
        self.customer_id = customer_id;
        self
    }

    /// Leave a booking out of conflict and usage checks
    pub fn excluding(mut self, booking_id: &str) -> Self {
        self.exclude_booking = Some(booking_id.to_string());
        self
    }

    pub fn mode(&self) -> AllocationMode {
        self.business.allocation_mode
    }

    pub fn slot_at(&self, start: DateTime<Utc>) -> TimeSlot {
        TimeSlot::new(start, start + self.service.duration())
    }

    /// Run the mode's checks for the slot starting at `start`, stopping at
    /// the first failure
    pub fn rejection<S: ScheduleStore + ?Sized>(
        &self,
        store: &S,
        start: DateTime<Utc>,
    ) -> Result<Option<Rejection>> {
        let slot = self.slot_at(start);
        let exclude = self.exclude_booking.as_deref();

        if !is_within_hours(store, &self.business.id, self.zone, &slot)? {
            return Ok(Some(Rejection::OutsideHours));
        }

        if self.mode().is_exclusive()
            && has_conflict(store, ConflictScope::Business(&self.business.id), &slot, exclude)?
        {
            return Ok(Some(Rejection::BusinessBusy));
        }

        if let Some(staff_id) = &self.staff_id {
            if !is_staff_available(store, staff_id, self.zone, &slot)? {
                return Ok(Some(Rejection::StaffUnavailable));
            }
            if has_conflict(store, ConflictScope::Staff(staff_id), &slot, exclude)? {
                return Ok(Some(Rejection::StaffBusy));
            }
        }

        if let Some(demand) = &self.resource {
            if !has_capacity(store, &demand.resource_type, &slot, demand.quantity, exclude)? {
                return Ok(Some(Rejection::CapacityExhausted));
            }
        }

        if let Some(customer_id) = &self.customer_id {
            if has_conflict(store, ConflictScope::Customer(customer_id), &slot, exclude)? {
                return Ok(Some(Rejection::CustomerBusy));
            }
        }

        Ok(None)
    }
}

fn resolve_staff<S: ScheduleStore + ?Sized>(
    store: &S,
    business: &Business,
    service: &Service,
    params: &ModeParams,
) -> Result<String> {
    let staff_id = params.staff_id.as_deref().ok_or_else(|| {
        BookingError::InvalidRequest(format!(
            "staff_id is required for {} businesses",
            business.allocation_mode
        ))
    })?;

    let staff = store
        .staff_member(staff_id)?
        .filter(|s| s.business_id == business.id)
        .ok_or_else(|| BookingError::not_found(EntityKind::Staff, staff_id))?;

    if !store.staff_provides_service(&staff.id, &service.id)? {
        return Err(BookingError::StaffCannotProvideService {
            staff_id: staff.id,
            service_id: service.id.clone(),
        });
    }
    Ok(staff.id)
}

fn resolve_resource<S: ScheduleStore + ?Sized>(
    store: &S,
    business: &Business,
    service: &Service,
    params: &ModeParams,
) -> Result<ResourceDemand> {
    let resource_type_id = match (params.resource_type_id.as_deref(), service.required_resource_types.as_slice()) {
        (Some(id), _) => id,
        (None, [only]) => only.as_str(),
        (None, _) => {
            return Err(BookingError::InvalidRequest(format!(
                "resource_type_id is required for {} businesses",
                business.allocation_mode
            )))
        }
    };

    let resource_type = store
        .resource_type(resource_type_id)?
        .filter(|rt| rt.business_id == business.id)
        .ok_or_else(|| BookingError::not_found(EntityKind::ResourceType, resource_type_id))?;

    let quantity = params.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(BookingError::InvalidRequest(
            "quantity must be at least 1".to_string(),
        ));
    }
    if quantity > resource_type.total_capacity {
        return Err(BookingError::InsufficientCapacity {
            resource_type_id: resource_type.id,
            requested: quantity,
            capacity: resource_type.total_capacity,
        });
    }

    Ok(ResourceDemand {
        resource_type,
        quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::engine::fixtures::{at, database, staff, studio};
    use crate::models::{Booking, BookingStatus, ResourceUsage};

    fn prepare(db: &Database, service: &str, params: ModeParams) -> Result<SlotPlan> {
        db.read(|s| SlotPlan::prepare(s, "biz", service, &params))
    }

    fn rejection(db: &Database, plan: &SlotPlan, start: &str) -> Option<Rejection> {
        db.read(|s| plan.rejection(s, at(start))).unwrap()
    }

    fn insert(db: &Database, id: &str, customer: &str, service: &str, start: &str, staff_id: Option<&str>, rooms: Option<u32>) {
        db.write(|s| {
            s.insert_booking(&Booking {
                id: id.to_string(),
                customer_id: customer.to_string(),
                business_id: "biz".to_string(),
                service_id: service.to_string(),
                staff_id: staff_id.map(str::to_string),
                start: at(start),
                end: at(start),
                status: BookingStatus::Confirmed,
                resource_usage: rooms.map(|quantity| ResourceUsage {
                    resource_type_id: "room".to_string(),
                    quantity,
                }),
                notes: None,
                created_at: 0,
                updated_at: 0,
            })
        })
        .unwrap();
    }

    #[test]
    fn test_prepare_rejects_unknown_entities() {
        let db = database(&studio(AllocationMode::StaffOnly));

        let err = db
            .read(|s| SlotPlan::prepare(s, "nope", "consult", &staff("ana")))
            .unwrap_err();
        assert!(matches!(err, BookingError::EntityNotFound { kind: EntityKind::Business, .. }));

        let err = prepare(&db, "massage", staff("ana")).unwrap_err();
        assert!(matches!(err, BookingError::EntityNotFound { kind: EntityKind::Service, .. }));

        let err = prepare(&db, "consult", staff("zoe")).unwrap_err();
        assert!(matches!(err, BookingError::EntityNotFound { kind: EntityKind::Staff, .. }));
    }

    #[test]
    fn test_prepare_rejects_foreign_service() {
        let db = database(&studio(AllocationMode::TimeOnly));
        let mut other = studio(AllocationMode::TimeOnly);
        other.id = "other".to_string();
        other.services[0].id = "other-consult".to_string();
        other.services[0].resource_types.clear();
        other.services.truncate(1);
        other.staff.clear();
        other.resource_types.clear();
        other.customers.clear();
        db.apply_seed(&other).unwrap();

        let err = prepare(&db, "other-consult", ModeParams::default()).unwrap_err();
        assert!(matches!(err, BookingError::EntityNotFound { kind: EntityKind::Service, .. }));
    }

    #[test]
    fn test_prepare_staff_capability() {
        let db = database(&studio(AllocationMode::StaffOnly));
        let err = prepare(&db, "consult", staff("ben")).unwrap_err();
        assert!(matches!(err, BookingError::StaffCannotProvideService { .. }));

        let err = prepare(&db, "consult", ModeParams::default()).unwrap_err();
        assert!(matches!(err, BookingError::InvalidRequest(_)));
    }

    #[test]
    fn test_prepare_resource_defaults() {
        let db = database(&studio(AllocationMode::ResourceOnly));
        let plan = prepare(&db, "consult", staff("ana")).unwrap();
        let demand = plan.resource.unwrap();
        assert_eq!(demand.resource_type.id, "room");
        assert_eq!(demand.quantity, 1);
        // Irrelevant to the mode
        assert!(plan.staff_id.is_none());

        // Workshop links no resource type, so one must be named
        let err = prepare(&db, "workshop", ModeParams::default()).unwrap_err();
        assert!(matches!(err, BookingError::InvalidRequest(_)));
    }

    #[test]
    fn test_prepare_quantity_bounds() {
        let db = database(&studio(AllocationMode::ResourceOnly));
        let params = |quantity| ModeParams {
            quantity: Some(quantity),
            ..ModeParams::default()
        };

        assert!(matches!(
            prepare(&db, "consult", params(0)).unwrap_err(),
            BookingError::InvalidRequest(_)
        ));
        assert!(matches!(
            prepare(&db, "consult", params(3)).unwrap_err(),
            BookingError::InsufficientCapacity { requested: 3, capacity: 2, .. }
        ));
        assert_eq!(prepare(&db, "consult", params(2)).unwrap().resource.unwrap().quantity, 2);
    }

    #[test]
    fn test_time_only_is_exclusive() {
        let db = database(&studio(AllocationMode::TimeOnly));
        let plan = prepare(&db, "consult", ModeParams::default()).unwrap();
        insert(&db, "b1", "c1", "workshop", "10:00", None, None);

        assert_eq!(rejection(&db, &plan, "08:30"), Some(Rejection::OutsideHours));
        assert_eq!(rejection(&db, &plan, "10:30"), Some(Rejection::BusinessBusy));
        assert_eq!(rejection(&db, &plan, "09:30"), None);
        assert_eq!(rejection(&db, &plan, "11:00"), None);
    }

    #[test]
    fn test_staff_and_resource_checks() {
        let db = database(&studio(AllocationMode::StaffAndResource));
        let plan = prepare(&db, "consult", staff("ana")).unwrap();

        insert(&db, "b1", "c1", "consult", "10:00", Some("ana"), Some(1));
        assert_eq!(rejection(&db, &plan, "10:00"), Some(Rejection::StaffBusy));

        // Ben's booking takes the other room but not Ana's time
        insert(&db, "b2", "c2", "consult", "11:00", Some("ben"), Some(2));
        assert_eq!(rejection(&db, &plan, "11:00"), Some(Rejection::CapacityExhausted));

        // Composite modes do not block the whole business
        assert_eq!(rejection(&db, &plan, "12:00"), None);

        let excluded = plan.clone().excluding("b1");
        assert_eq!(rejection(&db, &excluded, "10:00"), None);
    }

    #[test]
    fn test_customer_overlap_is_opt_in() {
        let db = database(&studio(AllocationMode::ResourceOnly));
        insert(&db, "b1", "c1", "consult", "10:00", None, Some(1));

        let plan = prepare(&db, "consult", ModeParams::default()).unwrap();
        assert_eq!(rejection(&db, &plan, "10:00"), None);

        let plan = plan.with_customer(Some("c1".to_string()));
        assert_eq!(rejection(&db, &plan, "10:00"), Some(Rejection::CustomerBusy));
        assert_eq!(rejection(&db, &plan, "10:30"), None);
    }
}
