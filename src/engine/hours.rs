use chrono_tz::Tz;

use crate::db::ScheduleStore;
use crate::error::Result;
use crate::models::TimeSlot;
use crate::time::local_span;

/// Check if `slot` lies inside one of the business's open periods for its
/// local day. A day without periods is closed.
pub fn is_within_hours<S: ScheduleStore + ?Sized>(
    store: &S,
    business_id: &str,
    zone: Tz,
    slot: &TimeSlot,
) -> Result<bool> {
    let Some(local) = local_span(zone, slot.start, slot.end) else {
        return Ok(false);
    };

    let periods = store.operating_hours(business_id, local.day_of_week)?;
    Ok(periods
        .iter()
        .any(|period| period.window.covers(local.start, local.end)))
}
