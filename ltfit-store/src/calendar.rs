//! Calendar view over reservations.

use chrono::{DateTime, TimeZone};
use ltfit_core::{CalendarEvent, ReservationRecord};

/// All reservations with usable times, sorted by start.
pub fn events(reservations: &[ReservationRecord]) -> Vec<CalendarEvent> {
    let mut events: Vec<CalendarEvent> = reservations
        .iter()
        .filter_map(ReservationRecord::to_event)
        .collect();
    events.sort_by_key(|e| e.start);
    events
}

/// Events overlapping `[start, end]`, sorted by start.
pub fn events_between<Tz: TimeZone>(
    reservations: &[ReservationRecord],
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
) -> Vec<CalendarEvent> {
    events(reservations)
        .into_iter()
        .filter(|e| e.overlaps(start, end))
        .collect()
}

/// The earliest-starting event that has not ended by `now`.
pub fn next_event<Tz: TimeZone>(
    reservations: &[ReservationRecord],
    now: &DateTime<Tz>,
) -> Option<CalendarEvent> {
    events(reservations).into_iter().find(|e| e.end >= *now)
}
