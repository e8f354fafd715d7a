use std::io;
use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::info;
use ulid::Ulid;

use crate::engine::EngineError;
use crate::model::*;
use crate::observability;
use crate::wal::Wal;

use super::Store;

// ── Group-commit journal writer ──────────────────────────

enum JournalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

type Pending = (Event, oneshot::Sender<io::Result<()>>);

/// Owns the journal file. Appends that queue up while a flush is running are
/// written together and share one fsync.
async fn journal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<JournalCommand>) {
    let mut held_back: Option<JournalCommand> = None;
    loop {
        let cmd = match held_back.take() {
            Some(cmd) => cmd,
            None => match rx.recv().await {
                Some(cmd) => cmd,
                None => return,
            },
        };

        match cmd {
            JournalCommand::Append { event, response } => {
                let mut batch: Vec<Pending> = vec![(event, response)];
                while let Ok(next) = rx.try_recv() {
                    match next {
                        JournalCommand::Append { event, response } => batch.push((event, response)),
                        other => {
                            held_back = Some(other);
                            break;
                        }
                    }
                }
                commit_batch(&mut wal, batch);
            }
            JournalCommand::Compact { events, response } => {
                let result = Wal::write_snapshot(wal.path(), &events)
                    .and_then(|()| wal.install_snapshot());
                let _ = response.send(result);
            }
            JournalCommand::AppendsSinceCompact { response } => {
                let _ = response.send(wal.appends_since_compact());
            }
        }
    }
}

fn commit_batch(wal: &mut Wal, batch: Vec<Pending>) {
    metrics::histogram!(observability::JOURNAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let started = std::time::Instant::now();

    let mut result = Ok(());
    for (event, _) in &batch {
        if let Err(e) = wal.append_buffered(event) {
            result = Err(e);
            break;
        }
    }
    // Flush even after a failed append so half-written bytes are not
    // attributed to the next batch.
    let flushed = wal.flush_sync();
    let result = result.and(flushed);

    metrics::histogram!(observability::JOURNAL_FLUSH_DURATION_SECONDS)
        .record(started.elapsed().as_secs_f64());

    for (_, response) in batch {
        let r = match &result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = response.send(r);
    }
}

fn journal_error(e: impl std::fmt::Display) -> EngineError {
    EngineError::Store(format!("journal: {e}"))
}

// ── Store ────────────────────────────────────────────────

/// Record store held in `DashMap` tables, optionally backed by an on-disk
/// journal that is replayed on open.
pub struct MemoryStore {
    services: DashMap<Ulid, Service>,
    bookings: DashMap<Ulid, Booking>,
    /// date → booking ids, in insertion order.
    bookings_by_date: DashMap<NaiveDate, Vec<Ulid>>,
    staff: DashMap<Ulid, Staff>,
    day_offs: DashMap<(Ulid, NaiveDate), DayOff>,
    journal: Option<mpsc::Sender<JournalCommand>>,
    /// Writers share it; compaction takes it exclusively so the snapshot
    /// never misses an in-flight record.
    commit_gate: RwLock<()>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Volatile store, nothing touches disk.
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
            bookings: DashMap::new(),
            bookings_by_date: DashMap::new(),
            staff: DashMap::new(),
            day_offs: DashMap::new(),
            journal: None,
            commit_gate: RwLock::new(()),
        }
    }

    /// Replay the journal at `path` and keep appending to it.
    /// Must be called from within a tokio runtime.
    pub fn open(path: &Path) -> io::Result<Self> {
        let events = Wal::replay(path)?;
        let wal = Wal::open(path)?;
        let (tx, rx) = mpsc::channel(4096);
        tokio::spawn(journal_writer_loop(wal, rx));

        let mut store = Self::new();
        for event in &events {
            store.apply(event);
        }
        store.journal = Some(tx);
        info!(
            "replayed {} journal records from {} ({} bookings)",
            events.len(),
            path.display(),
            store.bookings.len()
        );
        Ok(store)
    }

    pub fn is_durable(&self) -> bool {
        self.journal.is_some()
    }

    fn apply(&self, event: &Event) {
        match event {
            Event::ServiceSaved { service } => {
                self.services.insert(service.id, service.clone());
            }
            Event::BookingCreated { booking } => {
                if self.bookings.insert(booking.id, booking.clone()).is_none() {
                    self.bookings_by_date
                        .entry(booking.date)
                        .or_default()
                        .push(booking.id);
                }
            }
            Event::BookingStatusChanged { id, status } => {
                if let Some(mut booking) = self.bookings.get_mut(id) {
                    booking.status = *status;
                }
            }
            Event::StaffSaved { staff } => {
                self.staff.insert(staff.id, staff.clone());
            }
            Event::DayOffAdded { day_off } => {
                self.day_offs
                    .insert((day_off.staff_id, day_off.date), day_off.clone());
            }
            Event::DayOffRemoved { staff_id, date } => {
                self.day_offs.remove(&(*staff_id, *date));
            }
        }
    }

    async fn journal_append(&self, event: &Event) -> Result<(), EngineError> {
        let Some(tx) = &self.journal else {
            return Ok(());
        };
        let (response, rx) = oneshot::channel();
        tx.send(JournalCommand::Append { event: event.clone(), response })
            .await
            .map_err(|_| journal_error("writer shut down"))?;
        rx.await
            .map_err(|_| journal_error("writer dropped response"))?
            .map_err(journal_error)
    }

    /// Journal first, then make visible.
    async fn commit(&self, event: Event) -> Result<(), EngineError> {
        let _gate = self.commit_gate.read().await;
        self.journal_append(&event).await?;
        self.apply(&event);
        Ok(())
    }

    /// The minimal event list that recreates the current state.
    fn snapshot(&self) -> Vec<Event> {
        let mut events = Vec::new();

        let mut services: Vec<Service> = self.services.iter().map(|e| e.value().clone()).collect();
        services.sort_by_key(|s| s.id);
        events.extend(services.into_iter().map(|service| Event::ServiceSaved { service }));

        let mut staff: Vec<Staff> = self.staff.iter().map(|e| e.value().clone()).collect();
        staff.sort_by_key(|s| s.id);
        events.extend(staff.into_iter().map(|staff| Event::StaffSaved { staff }));

        let mut day_offs: Vec<DayOff> = self.day_offs.iter().map(|e| e.value().clone()).collect();
        day_offs.sort_by_key(|d| (d.date, d.staff_id));
        events.extend(day_offs.into_iter().map(|day_off| Event::DayOffAdded { day_off }));

        // Walk the date index so each day keeps its insertion order.
        let mut days: Vec<(NaiveDate, Vec<Ulid>)> = self
            .bookings_by_date
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        days.sort_by_key(|(date, _)| *date);
        for (_, ids) in days {
            events.extend(ids.iter().filter_map(|id| {
                self.bookings
                    .get(id)
                    .map(|b| Event::BookingCreated { booking: b.value().clone() })
            }));
        }

        events
    }

    /// Rewrite the journal as a snapshot of the current state.
    pub async fn compact(&self) -> Result<(), EngineError> {
        let Some(tx) = &self.journal else {
            return Ok(());
        };
        let _gate = self.commit_gate.write().await;
        let events = self.snapshot();
        let records = events.len();
        let (response, rx) = oneshot::channel();
        tx.send(JournalCommand::Compact { events, response })
            .await
            .map_err(|_| journal_error("writer shut down"))?;
        rx.await
            .map_err(|_| journal_error("writer dropped response"))?
            .map_err(journal_error)?;
        info!("journal compacted to {records} records");
        Ok(())
    }

    pub async fn appends_since_compact(&self) -> u64 {
        let Some(tx) = &self.journal else {
            return 0;
        };
        let (response, rx) = oneshot::channel();
        if tx.send(JournalCommand::AppendsSinceCompact { response }).await.is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn services(&self) -> Result<Vec<Service>, EngineError> {
        Ok(self.services.iter().map(|e| e.value().clone()).collect())
    }

    async fn service(&self, id: Ulid) -> Result<Option<Service>, EngineError> {
        Ok(self.services.get(&id).map(|e| e.value().clone()))
    }

    async fn save_service(&self, service: Service) -> Result<(), EngineError> {
        self.commit(Event::ServiceSaved { service }).await
    }

    async fn bookings_on(&self, date: NaiveDate) -> Result<Vec<Booking>, EngineError> {
        let ids = self
            .bookings_by_date
            .get(&date)
            .map(|e| e.value().clone())
            .unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| self.bookings.get(id).map(|e| e.value().clone()))
            .collect())
    }

    async fn booking(&self, id: Ulid) -> Result<Option<Booking>, EngineError> {
        Ok(self.bookings.get(&id).map(|e| e.value().clone()))
    }

    async fn insert_booking(&self, booking: Booking) -> Result<(), EngineError> {
        if self.bookings.contains_key(&booking.id) {
            return Err(EngineError::AlreadyExists(booking.id));
        }
        self.commit(Event::BookingCreated { booking }).await
    }

    async fn set_booking_status(&self, id: Ulid, status: BookingStatus) -> Result<(), EngineError> {
        if !self.bookings.contains_key(&id) {
            return Err(EngineError::NotFound(id));
        }
        self.commit(Event::BookingStatusChanged { id, status }).await
    }

    async fn staff(&self) -> Result<Vec<Staff>, EngineError> {
        Ok(self.staff.iter().map(|e| e.value().clone()).collect())
    }

    async fn staff_member(&self, id: Ulid) -> Result<Option<Staff>, EngineError> {
        Ok(self.staff.get(&id).map(|e| e.value().clone()))
    }

    async fn save_staff(&self, staff: Staff) -> Result<(), EngineError> {
        self.commit(Event::StaffSaved { staff }).await
    }

    async fn day_offs_on(&self, date: NaiveDate) -> Result<Vec<DayOff>, EngineError> {
        Ok(self
            .day_offs
            .iter()
            .filter(|e| e.key().1 == date)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn day_offs_for(&self, staff_id: Ulid) -> Result<Vec<DayOff>, EngineError> {
        let mut found: Vec<DayOff> = self
            .day_offs
            .iter()
            .filter(|e| e.key().0 == staff_id)
            .map(|e| e.value().clone())
            .collect();
        found.sort_by_key(|d| d.date);
        Ok(found)
    }

    async fn insert_day_off(&self, day_off: DayOff) -> Result<(), EngineError> {
        if self.day_offs.contains_key(&(day_off.staff_id, day_off.date)) {
            return Err(EngineError::AlreadyExists(day_off.staff_id));
        }
        self.commit(Event::DayOffAdded { day_off }).await
    }

    async fn delete_day_off(&self, staff_id: Ulid, date: NaiveDate) -> Result<(), EngineError> {
        if !self.day_offs.contains_key(&(staff_id, date)) {
            return Err(EngineError::NotFound(staff_id));
        }
        self.commit(Event::DayOffRemoved { staff_id, date }).await
    }
}
