use chrono::{DateTime, Duration, Utc};

use super::plan::SlotPlan;
use crate::db::ScheduleStore;
use crate::error::{BookingError, EntityKind, Result};
use crate::models::{AvailabilityRequest, AvailableSlot, TimeSlot};
use crate::time::to_display_zone;

/// Candidate starts `from, from + interval, ...` whose slot still ends by
/// `window.end`.
///
/// Fails instead of generating more than `max_candidates` starts.
pub fn candidate_starts(
    window: &TimeSlot,
    duration: Duration,
    interval_minutes: u32,
    max_candidates: usize,
) -> Result<Vec<DateTime<Utc>>> {
    let step = Duration::minutes(i64::from(interval_minutes.max(1)));
    let latest = window.end - duration;
    if latest < window.start {
        return Ok(Vec::new());
    }

    let count = (latest - window.start).num_seconds() / step.num_seconds() + 1;
    if count > max_candidates as i64 {
        return Err(BookingError::InvalidRequest(format!(
            "window yields {count} candidate slots, more than the limit of {max_candidates}; \
             narrow the window or widen the interval"
        )));
    }

    let mut starts = Vec::with_capacity(count as usize);
    let mut start = window.start;
    while start <= latest {
        starts.push(start);
        start += step;
    }
    Ok(starts)
}

/// List every slot in the request window that passes the business's mode
/// checks, in chronological order.
///
/// Run against one session so every candidate sees the same snapshot.
pub fn resolve_availability<S: ScheduleStore + ?Sized>(
    store: &S,
    req: &AvailabilityRequest,
    max_candidates: usize,
) -> Result<Vec<AvailableSlot>> {
    let plan = SlotPlan::prepare(store, &req.business_id, &req.service_id, &req.mode)?;

    if let Some(customer_id) = &req.customer_id {
        if store.customer(customer_id)?.is_none() {
            return Err(BookingError::not_found(EntityKind::Customer, customer_id));
        }
    }
    let plan = plan.with_customer(req.customer_id.clone());

    let starts = candidate_starts(
        &req.window,
        plan.service.duration(),
        req.interval_minutes,
        max_candidates,
    )?;
    let display_zone = req.display_zone.unwrap_or(plan.zone);

    let mut slots = Vec::new();
    for start in &starts {
        match plan.rejection(store, *start)? {
            None => {
                let slot = plan.slot_at(*start);
                slots.push(AvailableSlot {
                    start: slot.start,
                    end: slot.end,
                    local_start: to_display_zone(slot.start, display_zone),
                    local_end: to_display_zone(slot.end, display_zone),
                });
            }
            Some(reason) => tracing::trace!(start = %start, %reason, "slot rejected"),
        }
    }

    tracing::debug!(
        business = %req.business_id,
        service = %req.service_id,
        candidates = starts.len(),
        available = slots.len(),
        "resolved availability"
    );
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::{at, span};

    #[test]
    fn test_candidate_starts_respect_window_end() {
        let starts = candidate_starts(&span("08:00", "10:00"), Duration::minutes(30), 30, 100).unwrap();
        assert_eq!(starts, vec![at("08:00"), at("08:30"), at("09:00"), at("09:30")]);

        let starts = candidate_starts(&span("09:00", "10:00"), Duration::minutes(45), 20, 100).unwrap();
        assert_eq!(starts, vec![at("09:00")]);
    }

    #[test]
    fn test_window_shorter_than_service() {
        let starts = candidate_starts(&span("09:00", "09:20"), Duration::minutes(30), 15, 100).unwrap();
        assert!(starts.is_empty());
    }

    #[test]
    fn test_candidate_bound() {
        // 09:00..=16:30 every 15 minutes is 31 starts
        let window = span("09:00", "17:00");
        assert_eq!(candidate_starts(&window, Duration::minutes(30), 15, 31).unwrap().len(), 31);
        assert!(matches!(
            candidate_starts(&window, Duration::minutes(30), 15, 30),
            Err(BookingError::InvalidRequest(_))
        ));
    }
}
