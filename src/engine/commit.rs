use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::plan::SlotPlan;
use crate::db::ScheduleStore;
use crate::error::{BookingError, EntityKind, Result};
use crate::models::{
    Booking, BookingRequest, BookingStatus, BookingUpdate, ModeParams, ResourceUsage,
};

/// Generate a new booking id
pub fn new_booking_id() -> String {
    format!("bkg_{}", &Uuid::new_v4().to_string().replace('-', "")[..12])
}

/// Every staff member or resource type named in `params` must exist and
/// belong to the business, even when the business's mode does not use it
fn check_references<S: ScheduleStore + ?Sized>(
    store: &S,
    business_id: &str,
    params: &ModeParams,
) -> Result<()> {
    if let Some(staff_id) = params.staff_id.as_deref() {
        store
            .staff_member(staff_id)?
            .filter(|staff| staff.business_id == business_id)
            .ok_or_else(|| BookingError::not_found(EntityKind::Staff, staff_id))?;
    }
    if let Some(resource_type_id) = params.resource_type_id.as_deref() {
        store
            .resource_type(resource_type_id)?
            .filter(|rt| rt.business_id == business_id)
            .ok_or_else(|| BookingError::not_found(EntityKind::ResourceType, resource_type_id))?;
    }
    Ok(())
}

/// Re-check one slot and insert the booking.
///
/// Must run inside a write transaction: the re-check and the insert have to
/// see the same state, or two racing commits could both pass.
pub fn commit_booking<S: ScheduleStore + ?Sized>(
    store: &S,
    req: &BookingRequest,
    now: DateTime<Utc>,
) -> Result<Booking> {
    let customer = store
        .customer(&req.customer_id)?
        .ok_or_else(|| BookingError::not_found(EntityKind::Customer, &req.customer_id))?;

    let plan = SlotPlan::prepare(store, &req.business_id, &req.service_id, &req.mode)?
        .with_customer(req.prevent_customer_overlap.then(|| customer.id.clone()));
    check_references(store, &plan.business.id, &req.mode)?;

    if let Some(reason) = plan.rejection(store, req.booking_time)? {
        tracing::warn!(
            business = %req.business_id,
            service = %req.service_id,
            start = %req.booking_time,
            %reason,
            "slot taken before commit"
        );
        return Err(BookingError::SlotNoLongerAvailable {
            start: req.booking_time,
        });
    }

    let slot = plan.slot_at(req.booking_time);
    let booking = Booking {
        id: new_booking_id(),
        customer_id: customer.id,
        business_id: plan.business.id.clone(),
        service_id: plan.service.id.clone(),
        staff_id: plan.staff_id.clone(),
        start: slot.start,
        end: slot.end,
        status: BookingStatus::Confirmed,
        resource_usage: plan.resource.as_ref().map(|demand| ResourceUsage {
            resource_type_id: demand.resource_type.id.clone(),
            quantity: demand.quantity,
        }),
        notes: req.notes.clone(),
        created_at: now.timestamp(),
        updated_at: now.timestamp(),
    };
    store.insert_booking(&booking)?;

    tracing::info!(
        booking = %booking.id,
        business = %booking.business_id,
        customer = %booking.customer_id,
        start = %booking.start,
        "booking committed"
    );
    Ok(booking)
}

/// Apply changes to an existing booking.
///
/// Moving it, reassigning staff or reactivating a cancelled booking
/// re-checks the new slot, ignoring the booking's own footprint. Changes
/// that leave it cancelled, or only touch notes or status, are written
/// directly.
pub fn update_booking<S: ScheduleStore + ?Sized>(
    store: &S,
    booking_id: &str,
    update: &BookingUpdate,
    now: DateTime<Utc>,
) -> Result<Booking> {
    let current = store
        .booking(booking_id)?
        .ok_or_else(|| BookingError::not_found(EntityKind::Booking, booking_id))?;

    if let Some(staff_id) = update.staff_id.as_deref() {
        check_references(
            store,
            &current.business_id,
            &ModeParams {
                staff_id: Some(staff_id.to_string()),
                ..ModeParams::default()
            },
        )?;
    }

    let start = update.booking_time.unwrap_or(current.start);
    let staff_id = update.staff_id.clone().or_else(|| current.staff_id.clone());
    let status = update.status.unwrap_or(current.status);

    let moved = start != current.start || staff_id != current.staff_id;
    let reactivated = !current.is_active() && status != BookingStatus::Cancelled;

    let mut updated = current.clone();
    updated.status = status;
    updated.notes = update.notes.clone().or_else(|| current.notes.clone());
    updated.updated_at = now.timestamp();

    if status != BookingStatus::Cancelled && (moved || reactivated) {
        let params = ModeParams {
            staff_id,
            resource_type_id: current
                .resource_usage
                .as_ref()
                .map(|usage| usage.resource_type_id.clone()),
            quantity: current.resource_usage.as_ref().map(|usage| usage.quantity),
        };
        let customer_id = update
            .prevent_customer_overlap
            .then(|| current.customer_id.clone());
        let plan = SlotPlan::prepare(store, &current.business_id, &current.service_id, &params)?
            .with_customer(customer_id)
            .excluding(&current.id);

        if let Some(reason) = plan.rejection(store, start)? {
            tracing::warn!(booking = %current.id, start = %start, %reason, "update rejected");
            return Err(BookingError::SlotNoLongerAvailable { start });
        }

        let slot = plan.slot_at(start);
        updated.start = slot.start;
        updated.end = slot.end;
        if plan.mode().requires_staff() {
            updated.staff_id = plan.staff_id.clone();
        }
    } else if status == BookingStatus::Cancelled && moved {
        // Cancelled bookings hold nothing, so they may move freely
        updated.end = start + (current.end - current.start);
        updated.start = start;
        updated.staff_id = staff_id;
    }

    store.update_booking(&updated)?;
    tracing::info!(
        booking = %updated.id,
        status = %updated.status,
        start = %updated.start,
        "booking updated"
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ConflictScope, Database};
    use crate::engine::fixtures::{at, booking, database, span, staff, studio};
    use crate::models::AllocationMode;

    fn commit(db: &Database, req: &BookingRequest) -> Result<Booking> {
        db.write(|s| commit_booking(s, req, Utc::now()))
    }

    fn update(db: &Database, id: &str, change: BookingUpdate) -> Result<Booking> {
        db.write(|s| update_booking(s, id, &change, Utc::now()))
    }

    fn moved_to(start: &str) -> BookingUpdate {
        BookingUpdate {
            booking_time: Some(at(start)),
            ..BookingUpdate::default()
        }
    }

    #[test]
    fn test_booking_id_format() {
        let id = new_booking_id();
        assert!(id.starts_with("bkg_"));
        assert_eq!(id.len(), 16);
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_booking_id());
    }

    #[test]
    fn test_commit_persists_staff_and_usage() {
        let db = database(&studio(AllocationMode::StaffAndResource));
        let created = commit(&db, &booking("c1", "consult", "10:00", staff("ana"))).unwrap();

        assert_eq!(created.status, BookingStatus::Confirmed);
        assert_eq!(created.end, at("10:30"));
        assert_eq!(created.staff_id.as_deref(), Some("ana"));
        assert_eq!(created.resource_usage.as_ref().unwrap().quantity, 1);

        let stored = db.read(|s| s.booking(&created.id)).unwrap().unwrap();
        assert_eq!(stored.start, created.start);
        assert_eq!(stored.resource_usage, created.resource_usage);
    }

    #[test]
    fn test_commit_drops_params_the_mode_ignores() {
        let db = database(&studio(AllocationMode::TimeOnly));
        let created = commit(&db, &booking("c1", "consult", "10:00", staff("ana"))).unwrap();
        assert!(created.staff_id.is_none());
        assert!(created.resource_usage.is_none());
    }

    #[test]
    fn test_commit_checks_unused_references_exist() {
        let db = database(&studio(AllocationMode::TimeOnly));
        let err = commit(&db, &booking("c1", "consult", "10:00", staff("ghost-staff"))).unwrap_err();
        assert!(matches!(err, BookingError::EntityNotFound { kind: EntityKind::Staff, .. }));

        let db = database(&studio(AllocationMode::StaffOnly));
        let mut params = staff("ana");
        params.resource_type_id = Some("ghost-rt".to_string());
        let err = commit(&db, &booking("c1", "consult", "10:00", params)).unwrap_err();
        assert!(matches!(err, BookingError::EntityNotFound { kind: EntityKind::ResourceType, .. }));

        let written = db
            .read(|s| s.conflicting_bookings(ConflictScope::Business("biz"), &span("09:00", "17:00"), None))
            .unwrap();
        assert!(written.is_empty());
    }

    #[test]
    fn test_commit_unknown_customer() {
        let db = database(&studio(AllocationMode::TimeOnly));
        let err = commit(&db, &booking("ghost", "consult", "10:00", ModeParams::default())).unwrap_err();
        assert!(matches!(err, BookingError::EntityNotFound { kind: EntityKind::Customer, .. }));
    }

    #[test]
    fn test_second_commit_for_same_staff_slot_fails() {
        let db = database(&studio(AllocationMode::StaffOnly));
        commit(&db, &booking("c1", "workshop", "13:00", staff("ben"))).unwrap();

        let err = commit(&db, &booking("c2", "workshop", "13:30", staff("ben"))).unwrap_err();
        assert!(matches!(err, BookingError::SlotNoLongerAvailable { .. }));
        // Back to back is fine
        commit(&db, &booking("c2", "workshop", "14:00", staff("ben"))).unwrap();
        // Another staff member is free at the same time
        commit(&db, &booking("c3", "workshop", "13:00", staff("ana"))).unwrap();
    }

    #[test]
    fn test_commit_outside_hours_fails() {
        let db = database(&studio(AllocationMode::TimeOnly));
        let err = commit(&db, &booking("c1", "consult", "16:45", ModeParams::default())).unwrap_err();
        assert!(matches!(err, BookingError::SlotNoLongerAvailable { .. }));
        commit(&db, &booking("c1", "consult", "16:30", ModeParams::default())).unwrap();
    }

    #[test]
    fn test_customer_overlap_on_request() {
        let db = database(&studio(AllocationMode::ResourceOnly));
        commit(&db, &booking("c1", "consult", "10:00", ModeParams::default())).unwrap();

        let mut req = booking("c1", "consult", "10:15", ModeParams::default());
        req.prevent_customer_overlap = true;
        assert!(matches!(
            commit(&db, &req).unwrap_err(),
            BookingError::SlotNoLongerAvailable { .. }
        ));

        req.prevent_customer_overlap = false;
        commit(&db, &req).unwrap();
    }

    #[test]
    fn test_update_moves_and_ignores_own_footprint() {
        let db = database(&studio(AllocationMode::StaffOnly));
        let created = commit(&db, &booking("c1", "workshop", "10:00", staff("ana"))).unwrap();

        // Overlaps its old slot only
        let moved = update(&db, &created.id, moved_to("10:30")).unwrap();
        assert_eq!(moved.start, at("10:30"));
        assert_eq!(moved.end, at("11:30"));

        let stored = db.read(|s| s.booking(&created.id)).unwrap().unwrap();
        assert_eq!(stored.start, at("10:30"));
    }

    #[test]
    fn test_update_into_taken_slot_fails() {
        let db = database(&studio(AllocationMode::StaffOnly));
        let first = commit(&db, &booking("c1", "workshop", "10:00", staff("ana"))).unwrap();
        commit(&db, &booking("c2", "workshop", "12:00", staff("ana"))).unwrap();

        let err = update(&db, &first.id, moved_to("11:30")).unwrap_err();
        assert!(matches!(err, BookingError::SlotNoLongerAvailable { .. }));

        let stored = db.read(|s| s.booking(&first.id)).unwrap().unwrap();
        assert_eq!(stored.start, at("10:00"));
    }

    #[test]
    fn test_update_staff_checks_capability() {
        let db = database(&studio(AllocationMode::StaffOnly));
        let created = commit(&db, &booking("c1", "consult", "13:00", staff("ana"))).unwrap();

        let err = update(
            &db,
            &created.id,
            BookingUpdate {
                staff_id: Some("ben".to_string()),
                ..BookingUpdate::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::StaffCannotProvideService { .. }));
    }

    #[test]
    fn test_notes_only_update_skips_checks() {
        let db = database(&studio(AllocationMode::TimeOnly));
        let created = commit(&db, &booking("c1", "consult", "16:30", ModeParams::default())).unwrap();

        // Shrink the hours so the stored slot no longer fits
        let mut seed = studio(AllocationMode::TimeOnly);
        seed.hours = vec![crate::engine::fixtures::weekly(1, "09:00", "12:00")];
        db.apply_seed(&seed).unwrap();

        let updated = update(
            &db,
            &created.id,
            BookingUpdate {
                notes: Some("bring forms".to_string()),
                ..BookingUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(updated.notes.as_deref(), Some("bring forms"));
        assert_eq!(updated.start, at("16:30"));
    }

    #[test]
    fn test_cancel_frees_capacity_and_reactivation_rechecks() {
        let db = database(&studio(AllocationMode::ResourceOnly));
        let full = ModeParams {
            quantity: Some(2),
            ..ModeParams::default()
        };
        let first = commit(&db, &booking("c1", "consult", "10:00", full.clone())).unwrap();

        let cancelled = update(&db, &first.id, BookingUpdate::cancel()).unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        commit(&db, &booking("c2", "consult", "10:00", full)).unwrap();

        let err = update(
            &db,
            &first.id,
            BookingUpdate {
                status: Some(BookingStatus::Confirmed),
                ..BookingUpdate::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::SlotNoLongerAvailable { .. }));
    }

    #[test]
    fn test_update_unknown_booking() {
        let db = database(&studio(AllocationMode::TimeOnly));
        let err = update(&db, "bkg_missing", BookingUpdate::cancel()).unwrap_err();
        assert!(matches!(err, BookingError::EntityNotFound { kind: EntityKind::Booking, .. }));
    }
}
