use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use ulid::Ulid;

use crate::clock;
use crate::limits::*;
use crate::model::*;
use crate::observability;

use super::availability::is_time_slot_available;
use super::validate;
use super::{Engine, EngineError};

/// The catalog a new salon starts with:
/// `(name, zone, duration, available_from, available_to, is_active)`.
const DEFAULT_CATALOG: [(&str, Zone, Minutes, &str, &str, bool); 12] = [
    ("Haircut", Zone::Hair, 30, "09:00", "19:00", true),
    ("Wash and blow-dry", Zone::Hair, 45, "09:00", "19:00", true),
    ("Hair colour", Zone::Hair, 120, "09:00", "17:00", true),
    ("Perm", Zone::Hair, 180, "09:00", "16:00", true),
    ("Hair straightening", Zone::Hair, 150, "09:00", "16:30", false),
    ("Hair treatment", Zone::Hair, 45, "09:00", "19:00", true),
    ("Gel nails", Zone::Nail, 60, "10:00", "20:00", true),
    ("Nail polish", Zone::Nail, 45, "10:00", "20:00", true),
    ("Nail extensions", Zone::Nail, 90, "10:00", "18:30", true),
    ("Hand spa", Zone::Nail, 45, "10:00", "20:00", true),
    ("Foot spa", Zone::Nail, 60, "10:00", "20:00", true),
    ("Pedicure", Zone::Nail, 45, "10:00", "20:00", true),
];

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Engine {
    // ── Bookings ─────────────────────────────────────────────

    /// Validate, re-check against a fresh read, then write.
    ///
    /// The re-check and the write run under the (zone, date) gate. When the
    /// slot has filled up since the caller last looked, nothing is written
    /// and `SlotUnavailable` is returned.
    pub async fn submit_booking(&self, draft: BookingDraft) -> Result<Booking, EngineError> {
        validate::check_booking_draft(&draft)?;
        let services = self.resolve_services(&draft.service_ids).await?;
        let zone = validate::zone_of(&services)?;
        let total_duration = validate::total_duration(&services)?;
        let start = clock::time_to_minutes(&draft.time)?;
        let date = draft.date;

        let _day = self.lock_day(zone, date).await;
        let (bookings, capacity) = self.day_snapshot(zone, date).await?;
        if !is_time_slot_available(&bookings, date, &draft.time, zone, total_duration, Some(capacity))? {
            metrics::counter!(observability::SLOT_CONFLICTS_TOTAL, "zone" => zone.as_str())
                .increment(1);
            warn!("slot taken: {zone} {date} {} ({total_duration} min, capacity {capacity})", draft.time);
            return Err(EngineError::SlotUnavailable { date, time: draft.time });
        }

        let booking = Booking {
            id: Ulid::new(),
            services: services.iter().map(Service::snapshot).collect(),
            total_duration,
            zone,
            date,
            start,
            customer_name: draft.customer_name.trim().to_string(),
            customer_phone: draft.customer_phone.trim().to_string(),
            notes: non_empty(draft.notes),
            slip_image: non_empty(draft.slip_image),
            status: BookingStatus::Confirmed,
            channel: draft.channel,
            created_at: Utc::now(),
        };
        self.store.insert_booking(booking.clone()).await?;

        metrics::counter!(
            observability::BOOKINGS_CREATED_TOTAL,
            "zone" => zone.as_str(),
            "channel" => booking.channel.as_str()
        )
        .increment(1);
        info!(
            "booking {} confirmed: {zone} {date} {}-{}",
            booking.id,
            booking.time_label(),
            booking.end_label()
        );
        self.notify.send(zone, &Event::BookingCreated { booking: booking.clone() });
        Ok(booking)
    }

    /// Move a booking out of `confirmed`. Every other status is final.
    pub async fn update_status(&self, id: Ulid, status: BookingStatus) -> Result<Booking, EngineError> {
        let seen = self.booking(id).await?;
        let _day = self.lock_day(seen.zone, seen.date).await;
        // Re-read under the gate: another caller may have moved it.
        let current = self.booking(id).await?;
        if !current.status.can_transition_to(status) {
            return Err(EngineError::InvalidTransition { from: current.status, to: status });
        }
        self.store.set_booking_status(id, status).await?;

        metrics::counter!(observability::STATUS_CHANGES_TOTAL, "status" => status.as_str())
            .increment(1);
        info!("booking {id}: {} -> {status}", current.status);
        self.notify.send(current.zone, &Event::BookingStatusChanged { id, status });
        Ok(Booking { status, ..current })
    }

    pub async fn complete(&self, id: Ulid) -> Result<Booking, EngineError> {
        self.update_status(id, BookingStatus::Completed).await
    }

    /// Frees the seat for everyone else.
    pub async fn cancel(&self, id: Ulid) -> Result<Booking, EngineError> {
        self.update_status(id, BookingStatus::Cancelled).await
    }

    pub async fn mark_no_show(&self, id: Ulid) -> Result<Booking, EngineError> {
        self.update_status(id, BookingStatus::NoShow).await
    }

    // ── Catalog ──────────────────────────────────────────────

    pub async fn add_service(&self, draft: ServiceDraft) -> Result<Service, EngineError> {
        let (available_from, available_to) = validate::check_service_draft(&draft)?;
        let in_zone: Vec<Service> = self
            .store
            .services()
            .await?
            .into_iter()
            .filter(|s| s.zone == draft.zone)
            .collect();
        if in_zone.len() >= MAX_SERVICES_PER_ZONE {
            return Err(EngineError::LimitExceeded("too many services in zone"));
        }
        let next_rank = in_zone.iter().map(|s| s.sort_order).max().unwrap_or(0) + 1;

        let service = Service {
            id: Ulid::new(),
            name: draft.name.trim().to_string(),
            zone: draft.zone,
            duration: draft.duration,
            available_from,
            available_to,
            is_active: draft.is_active,
            sort_order: draft.sort_order.unwrap_or(next_rank),
        };
        self.store.save_service(service.clone()).await?;
        info!("service {} added to {}: {}", service.id, service.zone, service.name);
        Ok(service)
    }

    /// Replace a service's details. Existing bookings keep their snapshots.
    pub async fn update_service(&self, id: Ulid, draft: ServiceDraft) -> Result<Service, EngineError> {
        let (available_from, available_to) = validate::check_service_draft(&draft)?;
        let current = self.store.service(id).await?.ok_or(EngineError::NotFound(id))?;
        let service = Service {
            id,
            name: draft.name.trim().to_string(),
            zone: draft.zone,
            duration: draft.duration,
            available_from,
            available_to,
            is_active: draft.is_active,
            sort_order: draft.sort_order.unwrap_or(current.sort_order),
        };
        self.store.save_service(service.clone()).await?;
        Ok(service)
    }

    /// Services are never deleted, only switched off.
    pub async fn toggle_service_active(&self, id: Ulid) -> Result<Service, EngineError> {
        let mut service = self.store.service(id).await?.ok_or(EngineError::NotFound(id))?;
        service.is_active = !service.is_active;
        self.store.save_service(service.clone()).await?;
        info!(
            "service {id} {}",
            if service.is_active { "activated" } else { "deactivated" }
        );
        Ok(service)
    }

    /// Rank the listed services `1..` in the given order. Services of the
    /// zone that are not listed keep their rank. Returns the zone's catalog
    /// by rank.
    pub async fn reorder_services(&self, zone: Zone, ordered: &[Ulid]) -> Result<Vec<Service>, EngineError> {
        let mut in_zone: Vec<Service> = self
            .store
            .services()
            .await?
            .into_iter()
            .filter(|s| s.zone == zone)
            .collect();
        if let Some(&missing) = ordered.iter().find(|id| !in_zone.iter().any(|s| s.id == **id)) {
            return Err(EngineError::NotFound(missing));
        }

        for (index, id) in ordered.iter().enumerate() {
            let rank = index as u32 + 1;
            if let Some(service) = in_zone.iter_mut().find(|s| s.id == *id)
                && service.sort_order != rank
            {
                service.sort_order = rank;
                self.store.save_service(service.clone()).await?;
            }
        }
        in_zone.sort_by_key(|s| (s.sort_order, s.id));
        Ok(in_zone)
    }

    /// Install the starter catalog into an empty store. Returns how many
    /// services were added.
    pub async fn seed_default_services(&self) -> Result<usize, EngineError> {
        if !self.store.services().await?.is_empty() {
            return Ok(0);
        }
        let mut ranks = [0u32; 2];
        for (name, zone, duration, from, to, is_active) in DEFAULT_CATALOG {
            let rank = &mut ranks[zone as usize];
            *rank += 1;
            self.add_service(ServiceDraft {
                name: name.to_string(),
                zone,
                duration,
                available_from: from.to_string(),
                available_to: to.to_string(),
                is_active,
                sort_order: Some(*rank),
            })
            .await?;
        }
        info!("seeded {} default services", DEFAULT_CATALOG.len());
        Ok(DEFAULT_CATALOG.len())
    }

    // ── Staff ────────────────────────────────────────────────

    fn announce_staff_change(&self, role: StaffRole, event: &Event) {
        if let Some(zone) = role.zone() {
            self.notify.send(zone, event);
        }
    }

    pub async fn add_staff(&self, draft: StaffDraft) -> Result<Staff, EngineError> {
        validate::check_staff_draft(&draft)?;
        if self.store.staff().await?.len() >= MAX_STAFF {
            return Err(EngineError::LimitExceeded("too many staff"));
        }
        let staff = Staff {
            id: Ulid::new(),
            name: draft.name.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            email: non_empty(draft.email),
            role: draft.role,
            salary_base: draft.salary_base,
            commission_enabled: draft.commission_enabled,
            is_active: true,
        };
        self.store.save_staff(staff.clone()).await?;
        info!("staff {} added as {:?}", staff.id, staff.role);
        self.announce_staff_change(staff.role, &Event::StaffSaved { staff: staff.clone() });
        Ok(staff)
    }

    pub async fn update_staff(&self, id: Ulid, draft: StaffDraft) -> Result<Staff, EngineError> {
        validate::check_staff_draft(&draft)?;
        let current = self.store.staff_member(id).await?.ok_or(EngineError::NotFound(id))?;
        let staff = Staff {
            id,
            name: draft.name.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            email: non_empty(draft.email),
            role: draft.role,
            salary_base: draft.salary_base,
            commission_enabled: draft.commission_enabled,
            is_active: current.is_active,
        };
        self.store.save_staff(staff.clone()).await?;
        let event = Event::StaffSaved { staff: staff.clone() };
        self.announce_staff_change(current.role, &event);
        if staff.role != current.role {
            self.announce_staff_change(staff.role, &event);
        }
        Ok(staff)
    }

    pub async fn set_staff_active(&self, id: Ulid, active: bool) -> Result<Staff, EngineError> {
        let mut staff = self.store.staff_member(id).await?.ok_or(EngineError::NotFound(id))?;
        if staff.is_active == active {
            return Ok(staff);
        }
        staff.is_active = active;
        self.store.save_staff(staff.clone()).await?;
        info!("staff {id} {}", if active { "activated" } else { "deactivated" });
        self.announce_staff_change(staff.role, &Event::StaffSaved { staff: staff.clone() });
        Ok(staff)
    }

    // ── Day-offs ─────────────────────────────────────────────

    pub async fn add_day_off(
        &self,
        staff_id: Ulid,
        date: NaiveDate,
        note: Option<String>,
    ) -> Result<DayOff, EngineError> {
        let note = non_empty(note);
        if let Some(ref n) = note
            && n.len() > MAX_NOTE_LEN
        {
            return Err(EngineError::LimitExceeded("day-off note too long"));
        }
        let staff = self
            .store
            .staff_member(staff_id)
            .await?
            .ok_or(EngineError::NotFound(staff_id))?;

        let day_off = DayOff { staff_id, date, note };
        self.store.insert_day_off(day_off.clone()).await?;
        info!("staff {staff_id} off on {date}");
        self.announce_staff_change(staff.role, &Event::DayOffAdded { day_off: day_off.clone() });
        Ok(day_off)
    }

    pub async fn remove_day_off(&self, staff_id: Ulid, date: NaiveDate) -> Result<(), EngineError> {
        self.store.delete_day_off(staff_id, date).await?;
        info!("staff {staff_id} back on {date}");
        if let Some(staff) = self.store.staff_member(staff_id).await? {
            self.announce_staff_change(staff.role, &Event::DayOffRemoved { staff_id, date });
        }
        Ok(())
    }
}
