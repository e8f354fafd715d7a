//! Record storage boundary.
//!
//! The availability engine never owns records: it reads fresh snapshots
//! through [`Store`] and writes through it once a booking passes
//! re-validation. Any backend with plain create/read/update of these
//! records can sit behind the trait.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use ulid::Ulid;

use crate::engine::EngineError;
use crate::model::*;

#[async_trait]
pub trait Store: Send + Sync {
    // ── Catalog ──────────────────────────────────────────────

    async fn services(&self) -> Result<Vec<Service>, EngineError>;

    async fn service(&self, id: Ulid) -> Result<Option<Service>, EngineError>;

    /// Insert or replace.
    async fn save_service(&self, service: Service) -> Result<(), EngineError>;

    // ── Bookings ─────────────────────────────────────────────

    /// Every booking on `date`, cancelled ones included.
    async fn bookings_on(&self, date: NaiveDate) -> Result<Vec<Booking>, EngineError>;

    async fn booking(&self, id: Ulid) -> Result<Option<Booking>, EngineError>;

    /// Fails with `AlreadyExists` if the id is taken.
    async fn insert_booking(&self, booking: Booking) -> Result<(), EngineError>;

    /// Fails with `NotFound` for an unknown id.
    async fn set_booking_status(&self, id: Ulid, status: BookingStatus) -> Result<(), EngineError>;

    // ── Staff ────────────────────────────────────────────────

    async fn staff(&self) -> Result<Vec<Staff>, EngineError>;

    async fn staff_member(&self, id: Ulid) -> Result<Option<Staff>, EngineError>;

    /// Insert or replace.
    async fn save_staff(&self, staff: Staff) -> Result<(), EngineError>;

    // ── Day-offs ─────────────────────────────────────────────

    async fn day_offs_on(&self, date: NaiveDate) -> Result<Vec<DayOff>, EngineError>;

    async fn day_offs_for(&self, staff_id: Ulid) -> Result<Vec<DayOff>, EngineError>;

    /// Fails with `AlreadyExists` if the staff member already has that date off.
    async fn insert_day_off(&self, day_off: DayOff) -> Result<(), EngineError>;

    /// Fails with `NotFound` if there is no such record.
    async fn delete_day_off(&self, staff_id: Ulid, date: NaiveDate) -> Result<(), EngineError>;
}
