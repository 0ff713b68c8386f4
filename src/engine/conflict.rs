use crate::db::{ConflictScope, ScheduleStore};
use crate::error::Result;
use crate::models::TimeSlot;

/// Check if any active booking in `scope` overlaps `slot`. Bookings that
/// merely touch the slot's endpoints do not count.
pub fn has_conflict<S: ScheduleStore + ?Sized>(
    store: &S,
    scope: ConflictScope<'_>,
    slot: &TimeSlot,
    exclude_booking: Option<&str>,
) -> Result<bool> {
    let conflicts = store.conflicting_bookings(scope, slot, exclude_booking)?;
    if let Some(first) = conflicts.first() {
        tracing::debug!(
            ?scope,
            booking = %first.id,
            count = conflicts.len(),
            "slot overlaps existing booking"
        );
    }
    Ok(!conflicts.is_empty())
}
