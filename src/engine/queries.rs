use std::time::Instant;

use chrono::NaiveDate;
use tracing::debug;
use ulid::Ulid;

use crate::model::*;
use crate::observability;

use super::availability::{is_time_slot_available, unavailable_times_on};
use super::capacity;
use super::{Engine, EngineError};

impl Engine {
    /// Live capacity of `zone` on `date`.
    ///
    /// A zone with no staff on record at all falls back to the configured
    /// capacity. Once the roster has anyone for the zone, the live count
    /// applies, zero included.
    pub async fn zone_capacity(&self, zone: Zone, date: NaiveDate) -> Result<u32, EngineError> {
        let (staff, day_offs) =
            futures::try_join!(self.store.staff(), self.store.day_offs_on(date))?;
        let capacity = if staff.iter().any(|s| s.role.zone() == Some(zone)) {
            capacity::zone_capacity(&staff, &day_offs, zone, date)
        } else {
            self.settings.fallback_capacity(zone)
        };
        metrics::gauge!(observability::ZONE_CAPACITY, "zone" => zone.as_str()).set(capacity as f64);
        debug!("capacity {zone} {date}: {capacity}");
        Ok(capacity)
    }

    /// Fresh bookings and live capacity for one zone and day.
    pub(super) async fn day_snapshot(
        &self,
        zone: Zone,
        date: NaiveDate,
    ) -> Result<(Vec<Booking>, u32), EngineError> {
        futures::try_join!(self.store.bookings_on(date), self.zone_capacity(zone, date))
    }

    /// Whether a `duration`-minute booking could start at `time`, against
    /// the current store contents.
    pub async fn is_slot_available(
        &self,
        date: NaiveDate,
        time: &str,
        zone: Zone,
        duration: Minutes,
    ) -> Result<bool, EngineError> {
        let started = Instant::now();
        let (bookings, capacity) = self.day_snapshot(zone, date).await?;
        let available = is_time_slot_available(&bookings, date, time, zone, duration, Some(capacity))?;
        record_query("slot", zone, started);
        Ok(available)
    }

    /// Grid labels that cannot take a `duration`-minute booking, against the
    /// current store contents and the configured grid.
    pub async fn unavailable_times_for(
        &self,
        date: NaiveDate,
        zone: Zone,
        duration: Minutes,
    ) -> Result<Vec<String>, EngineError> {
        let started = Instant::now();
        let (bookings, capacity) = self.day_snapshot(zone, date).await?;
        let taken =
            unavailable_times_on(&self.settings.grid, &bookings, date, zone, duration, Some(capacity))?;
        record_query("grid", zone, started);
        Ok(taken)
    }

    pub async fn booking(&self, id: Ulid) -> Result<Booking, EngineError> {
        self.store.booking(id).await?.ok_or(EngineError::NotFound(id))
    }

    /// Every booking on `date` in creation order, cancelled ones included.
    pub async fn bookings_on(&self, date: NaiveDate) -> Result<Vec<Booking>, EngineError> {
        self.store.bookings_on(date).await
    }

    /// Bookings on `date` that still hold a seat, ordered by start time.
    pub async fn active_bookings_on(&self, date: NaiveDate) -> Result<Vec<Booking>, EngineError> {
        let mut bookings: Vec<Booking> = self
            .store
            .bookings_on(date)
            .await?
            .into_iter()
            .filter(|b| b.status.occupies_capacity())
            .collect();
        bookings.sort_by_key(|b| (b.start, b.created_at));
        Ok(bookings)
    }

    /// Whole catalog, active or not, grouped by zone then rank.
    pub async fn services(&self) -> Result<Vec<Service>, EngineError> {
        let mut services = self.store.services().await?;
        services.sort_by_key(|s| (s.zone, s.sort_order, s.id));
        Ok(services)
    }

    /// Services a customer can pick in `zone`, by rank.
    pub async fn active_services(&self, zone: Zone) -> Result<Vec<Service>, EngineError> {
        let mut services: Vec<Service> = self
            .store
            .services()
            .await?
            .into_iter()
            .filter(|s| s.zone == zone && s.is_active)
            .collect();
        services.sort_by_key(|s| (s.sort_order, s.id));
        Ok(services)
    }

    pub async fn staff(&self) -> Result<Vec<Staff>, EngineError> {
        let mut staff = self.store.staff().await?;
        staff.sort_by_key(|s| s.id);
        Ok(staff)
    }

    pub async fn day_offs_for(&self, staff_id: Ulid) -> Result<Vec<DayOff>, EngineError> {
        self.store.day_offs_for(staff_id).await
    }
}

fn record_query(query: &'static str, zone: Zone, started: Instant) {
    metrics::counter!(observability::QUERIES_TOTAL, "query" => query, "zone" => zone.as_str())
        .increment(1);
    metrics::histogram!(observability::QUERY_DURATION_SECONDS, "query" => query)
        .record(started.elapsed().as_secs_f64());
}
