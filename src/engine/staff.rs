use chrono_tz::Tz;

use crate::db::ScheduleStore;
use crate::error::Result;
use crate::models::{ClockTime, StaffAvailabilityRule, TimeSlot};
use crate::time::local_span;

/// Check if a staff member works for the whole of `slot`.
///
/// Weekly schedule rules for the local day and exception rules for the local
/// date both grant time. A 00:00-23:59 exception blocks the date outright,
/// whatever else is defined.
pub fn is_staff_available<S: ScheduleStore + ?Sized>(
    store: &S,
    staff_id: &str,
    zone: Tz,
    slot: &TimeSlot,
) -> Result<bool> {
    let Some(local) = local_span(zone, slot.start, slot.end) else {
        return Ok(false);
    };

    let rules = store.staff_rules(staff_id, local.day_of_week, local.date)?;
    Ok(rules_cover(&rules, local.start, local.end))
}

pub(crate) fn rules_cover(rules: &[StaffAvailabilityRule], start: ClockTime, end: ClockTime) -> bool {
    if rules.iter().any(StaffAvailabilityRule::is_full_day_block) {
        return false;
    }
    rules.iter().any(|rule| rule.window.covers(start, end))
}
