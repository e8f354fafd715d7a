use chrono::NaiveDate;

use crate::clock::{self, SlotGrid};
use crate::limits::MAX_TOTAL_DURATION;
use crate::model::*;

use super::capacity::effective_capacity;
use super::EngineError;

// ── Availability Algorithm ────────────────────────────────────────

/// Intervals of the bookings that hold a seat in `zone` on `date`.
/// Cancelled bookings never take part in overlap counting. Every other
/// booking counts, even one whose stored duration is zero.
pub fn occupied_spans(bookings: &[Booking], date: NaiveDate, zone: Zone) -> Vec<Span> {
    let mut spans: Vec<Span> = bookings
        .iter()
        .filter(|b| b.date == date && b.zone == zone && b.status.occupies_capacity())
        .map(|b| Span {
            start: b.start,
            end: b.start.saturating_add(b.total_duration),
        })
        .collect();
    spans.sort_by_key(|s| s.start);
    spans
}

/// How many occupied intervals intersect `candidate`.
pub fn overlap_count(occupied: &[Span], candidate: &Span) -> u32 {
    // Sorted by start: nothing at or after candidate.end can overlap.
    let right_bound = occupied.partition_point(|s| s.start < candidate.end);
    occupied[..right_bound]
        .iter()
        .filter(|s| s.overlaps(candidate))
        .count() as u32
}

/// The one admission predicate both public queries share.
fn admits(overlaps: u32, capacity: u32) -> bool {
    overlaps < capacity
}

fn check_duration(duration: Minutes) -> Result<(), EngineError> {
    if duration <= 0 {
        return Err(EngineError::InvalidDuration(duration));
    }
    if duration > MAX_TOTAL_DURATION {
        return Err(EngineError::LimitExceeded("duration too long"));
    }
    Ok(())
}

/// Is there still a free seat in `zone` for `[time, time + duration)`?
///
/// `capacity` should come from the capacity resolver; `None` falls back to
/// the zone's static default. A capacity of zero rejects every time.
pub fn is_time_slot_available(
    bookings: &[Booking],
    date: NaiveDate,
    time: &str,
    zone: Zone,
    duration: Minutes,
    capacity: Option<u32>,
) -> Result<bool, EngineError> {
    let start = clock::time_to_minutes(time)?;
    check_duration(duration)?;
    let capacity = effective_capacity(zone, capacity);
    if capacity == 0 {
        return Ok(false);
    }

    let occupied = occupied_spans(bookings, date, zone);
    let candidate = Span::at(start, duration);
    Ok(admits(overlap_count(&occupied, &candidate), capacity))
}

/// Labels of the default 08:00–22:00 grid (stepped by `slot_interval`) that
/// cannot take a booking of `duration` minutes.
pub fn unavailable_times(
    bookings: &[Booking],
    date: NaiveDate,
    zone: Zone,
    duration: Minutes,
    slot_interval: Minutes,
    capacity: Option<u32>,
) -> Result<Vec<String>, EngineError> {
    let grid = SlotGrid::with_interval(slot_interval)?;
    unavailable_times_on(&grid, bookings, date, zone, duration, capacity)
}

/// Same as [`unavailable_times`] over an explicit grid.
pub fn unavailable_times_on(
    grid: &SlotGrid,
    bookings: &[Booking],
    date: NaiveDate,
    zone: Zone,
    duration: Minutes,
    capacity: Option<u32>,
) -> Result<Vec<String>, EngineError> {
    check_duration(duration)?;
    if grid.interval <= 0 {
        return Err(EngineError::InvalidSlotInterval(grid.interval));
    }
    let capacity = effective_capacity(zone, capacity);
    if capacity == 0 {
        return Ok(grid.labels());
    }

    let occupied = occupied_spans(bookings, date, zone);
    Ok(grid
        .starts()
        .filter(|&start| !admits(overlap_count(&occupied, &Span::at(start, duration)), capacity))
        .map(clock::minutes_to_time)
        .collect())
}
