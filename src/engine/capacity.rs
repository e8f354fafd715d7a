use chrono::NaiveDate;

use crate::model::*;

// ── Capacity Resolver ────────────────────────────────────────────

/// Number of staff able to serve `zone` on `date`: active, with a matching
/// role, and without a day-off record for that date.
///
/// Zero means the zone is closed for the day.
pub fn zone_capacity(staff: &[Staff], day_offs: &[DayOff], zone: Zone, date: NaiveDate) -> u32 {
    staff
        .iter()
        .filter(|s| s.is_active && s.role.zone() == Some(zone))
        .filter(|s| !day_offs.iter().any(|d| d.staff_id == s.id && d.date == date))
        .count() as u32
}

/// Capacity to admit against: the live figure when the caller has one,
/// otherwise the zone's static default.
pub fn effective_capacity(zone: Zone, capacity: Option<u32>) -> u32 {
    capacity.unwrap_or_else(|| zone.default_capacity())
}
