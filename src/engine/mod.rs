pub mod availability;
pub mod capacity;
mod error;
mod flow;
mod mutations;
mod queries;
pub mod validate;
#[cfg(test)]
mod tests;

pub use availability::{is_time_slot_available, unavailable_times, unavailable_times_on};
pub use capacity::zone_capacity;
pub use error::EngineError;
pub use flow::{service_window, SlotBoard, SlotView};

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use ulid::Ulid;

use crate::config::Settings;
use crate::model::*;
use crate::notify::NotifyHub;
use crate::store::Store;

type DayLocks = DashMap<(Zone, NaiveDate), Arc<Mutex<()>>>;

/// Held while a (zone, date) is being re-checked and written. On drop the
/// gate leaves the map unless another caller is holding or waiting on it.
pub(super) struct DayGuard<'a> {
    locks: &'a DayLocks,
    key: (Zone, NaiveDate),
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for DayGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Count 1: only the map holds it, nobody waits.
        self.locks.remove_if(&self.key, |_, gate| Arc::strong_count(gate) == 1);
    }
}

/// Booking service over a [`Store`].
///
/// Holds no booking state of its own: every query and every submission reads
/// a fresh snapshot from the store and runs the pure availability functions
/// over it.
pub struct Engine {
    store: Arc<dyn Store>,
    pub notify: Arc<NotifyHub>,
    settings: Settings,
    /// One gate per (zone, date). Re-check and write happen under it so two
    /// submissions in this process cannot both take the last seat.
    day_locks: DayLocks,
}

impl Engine {
    pub fn new(store: Arc<dyn Store>, notify: Arc<NotifyHub>, settings: Settings) -> Self {
        Self {
            store,
            notify,
            settings,
            day_locks: DashMap::new(),
        }
    }

    pub(super) async fn lock_day(&self, zone: Zone, date: NaiveDate) -> DayGuard<'_> {
        let key = (zone, date);
        let gate = self
            .day_locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        DayGuard {
            locks: &self.day_locks,
            key,
            guard: Some(gate.lock_owned().await),
        }
    }

    /// Fetch services by id, in the given order. Each must exist and be active.
    pub(super) async fn resolve_services(&self, ids: &[Ulid]) -> Result<Vec<Service>, EngineError> {
        let mut services = Vec::with_capacity(ids.len());
        for &id in ids {
            let service = self.store.service(id).await?.ok_or(EngineError::NotFound(id))?;
            if !service.is_active {
                return Err(EngineError::InactiveService(id));
            }
            services.push(service);
        }
        Ok(services)
    }
}
