use std::collections::HashSet;

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::debug;
use ulid::Ulid;

use crate::clock;
use crate::model::*;

use super::availability::unavailable_times_on;
use super::validate;
use super::{Engine, EngineError};

/// Latest opening and earliest closing across the selected services.
/// `None` when the windows do not intersect.
pub fn service_window(services: &[Service]) -> Option<Span> {
    let from = services.iter().map(|s| s.available_from).max()?;
    let to = services.iter().map(|s| s.available_to).min()?;
    (from < to).then(|| Span::new(from, to))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub time: String,
    pub available: bool,
}

/// What a customer sees after picking services and a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotBoard {
    pub date: NaiveDate,
    pub zone: Zone,
    pub total_duration: Minutes,
    pub capacity: u32,
    /// Nobody is working in the zone that day.
    pub closed: bool,
    pub slots: Vec<SlotView>,
}

impl SlotBoard {
    pub fn available_times(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().filter(|s| s.available).map(|s| s.time.as_str())
    }

    /// Whether `start` is shown on the board and can still be picked.
    pub fn offers(&self, start: Minutes) -> bool {
        self.slots
            .iter()
            .any(|s| s.available && clock::time_to_minutes(&s.time).is_ok_and(|m| m == start))
    }
}

impl Engine {
    /// Online bookings run from today up to, not including, today + horizon.
    fn check_horizon(&self, date: NaiveDate, today: NaiveDate) -> Result<(), EngineError> {
        let last = today
            .checked_add_days(Days::new(u64::from(self.settings.horizon_days)))
            .ok_or(EngineError::OutsideBookingHorizon(date))?;
        if date < today || date >= last {
            return Err(EngineError::OutsideBookingHorizon(date));
        }
        Ok(())
    }

    /// The grid for `date` narrowed to what the selected services allow.
    ///
    /// A slot is shown when the whole appointment fits inside every selected
    /// service's window and, on the current day, it starts at least the
    /// configured lead time after `now`. Each shown slot is flagged with the
    /// same admission test used at submission.
    pub async fn slot_board(
        &self,
        date: NaiveDate,
        service_ids: &[Ulid],
        now: NaiveDateTime,
    ) -> Result<SlotBoard, EngineError> {
        self.check_horizon(date, now.date())?;
        let services = self.resolve_services(service_ids).await?;
        let zone = validate::zone_of(&services)?;
        let total_duration = validate::total_duration(&services)?;

        let (bookings, capacity) = self.day_snapshot(zone, date).await?;
        let grid = &self.settings.grid;
        let taken: HashSet<String> =
            unavailable_times_on(grid, &bookings, date, zone, total_duration, Some(capacity))?
                .into_iter()
                .collect();

        let earliest = if date == now.date() {
            clock::minutes_of(now.time()) + self.settings.same_day_lead
        } else {
            Minutes::MIN
        };
        let slots = match service_window(&services) {
            None => Vec::new(),
            Some(window) => grid
                .starts()
                .filter(|&start| start >= earliest)
                .filter(|&start| window.contains_span(&Span::at(start, total_duration)))
                .map(|start| {
                    let time = clock::minutes_to_time(start);
                    let available = !taken.contains(&time);
                    SlotView { time, available }
                })
                .collect(),
        };
        debug!(
            "board {zone} {date}: {} of {} slots open",
            slots.iter().filter(|s| s.available).count(),
            slots.len()
        );

        Ok(SlotBoard {
            date,
            zone,
            total_duration,
            capacity,
            closed: capacity == 0,
            slots,
        })
    }

    /// Customer self-service booking.
    ///
    /// On top of [`Engine::submit_booking`]: the phone must be a Thai mobile
    /// number, the date must be inside the booking horizon and the time must
    /// be one the customer's slot board offers.
    pub async fn book_online(&self, draft: BookingDraft, now: NaiveDateTime) -> Result<Booking, EngineError> {
        if !validate::is_valid_thai_phone(&draft.customer_phone) {
            return Err(EngineError::InvalidPhone(draft.customer_phone));
        }
        validate::check_booking_draft(&draft)?;
        let start = clock::time_to_minutes(&draft.time)?;
        let board = self.slot_board(draft.date, &draft.service_ids, now).await?;
        if !board.offers(start) {
            return Err(EngineError::SlotUnavailable { date: draft.date, time: draft.time });
        }
        self.submit_booking(BookingDraft { channel: Channel::Web, ..draft }).await
    }
}
