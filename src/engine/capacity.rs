use crate::db::ScheduleStore;
use crate::error::Result;
use crate::models::{ResourceType, TimeSlot};

/// Check if `required` more units of a resource type fit alongside the
/// active bookings overlapping `slot`
pub fn has_capacity<S: ScheduleStore + ?Sized>(
    store: &S,
    resource_type: &ResourceType,
    slot: &TimeSlot,
    required: u32,
    exclude_booking: Option<&str>,
) -> Result<bool> {
    let used = store.reserved_quantity(&resource_type.id, slot, exclude_booking)?;
    let fits = fits(resource_type.total_capacity, used, required);
    if !fits {
        tracing::debug!(
            resource_type = %resource_type.id,
            used,
            required,
            capacity = resource_type.total_capacity,
            "resource type exhausted"
        );
    }
    Ok(fits)
}

fn fits(capacity: u32, used: u32, required: u32) -> bool {
    used.checked_add(required)
        .is_some_and(|total| total <= capacity)
}
