use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::clock;

/// Minutes since midnight, or a length of time in minutes.
pub type Minutes = i32;

/// Half-open interval `[start, end)` in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Minutes,
    pub end: Minutes,
}

impl Span {
    pub fn new(start: Minutes, end: Minutes) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    /// Span starting at `start` and lasting `duration` minutes.
    pub fn at(start: Minutes, duration: Minutes) -> Self {
        Self::new(start, start + duration)
    }

    pub fn duration(&self) -> Minutes {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        clock::intervals_overlap(self.start, self.end, other.start, other.end)
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains_span(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

// ── Zones and roles ──────────────────────────────────────────────

/// Service category with its own staffing pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Hair,
    Nail,
}

impl Zone {
    pub const ALL: [Zone; 2] = [Zone::Hair, Zone::Nail];

    /// Concurrency assumed when no live staffing data is supplied.
    pub fn default_capacity(self) -> u32 {
        match self {
            Zone::Hair => 1,
            Zone::Nail => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Zone::Hair => "hair",
            Zone::Nail => "nail",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Zone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hair" => Ok(Zone::Hair),
            "nail" => Ok(Zone::Nail),
            other => Err(format!("unknown zone: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Owner,
    Manager,
    Reception,
    Hair,
    Nail,
}

impl StaffRole {
    /// The zone this role serves, if it counts towards zone capacity at all.
    pub fn zone(self) -> Option<Zone> {
        match self {
            StaffRole::Hair => Some(Zone::Hair),
            StaffRole::Nail => Some(Zone::Nail),
            StaffRole::Owner | StaffRole::Manager | StaffRole::Reception => None,
        }
    }
}

// ── Catalog ──────────────────────────────────────────────────────

/// A sellable offering in the live catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: Ulid,
    pub name: String,
    pub zone: Zone,
    pub duration: Minutes,
    /// Earliest start time this service may be booked at.
    pub available_from: Minutes,
    /// The service must be finished by this time.
    pub available_to: Minutes,
    pub is_active: bool,
    /// Display rank within the zone.
    pub sort_order: u32,
}

impl Service {
    pub fn window(&self) -> Span {
        Span::new(self.available_from, self.available_to)
    }

    pub fn snapshot(&self) -> ServiceSnapshot {
        ServiceSnapshot {
            service_id: Some(self.id),
            name: self.name.clone(),
            duration: self.duration,
        }
    }
}

/// Copy of a service embedded in a booking at creation time.
/// Later catalog edits never reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub service_id: Option<Ulid>,
    pub name: String,
    pub duration: Minutes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDraft {
    pub name: String,
    pub zone: Zone,
    pub duration: Minutes,
    /// `HH:mm`
    pub available_from: String,
    /// `HH:mm`
    pub available_to: String,
    pub is_active: bool,
    /// `None` appends the service at the end of its zone.
    pub sort_order: Option<u32>,
}

// ── Bookings ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Completed,
    Cancelled,
    #[serde(rename = "no-show")]
    NoShow,
}

impl BookingStatus {
    /// `confirmed` is the only non-terminal state.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (
                BookingStatus::Confirmed,
                BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow
            )
        )
    }

    pub fn is_terminal(self) -> bool {
        self != BookingStatus::Confirmed
    }

    /// Whether a booking in this state still takes up a seat in its zone.
    /// No-shows keep their seat; only cancellations free it.
    pub fn occupies_capacity(self) -> bool {
        self != BookingStatus::Cancelled
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no-show",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a booking came from. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Web,
    #[serde(rename = "walk-in")]
    WalkIn,
    Line,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Web => "web",
            Channel::WalkIn => "walk-in",
            Channel::Line => "line",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub services: Vec<ServiceSnapshot>,
    /// Sum of the snapshot durations.
    pub total_duration: Minutes,
    pub zone: Zone,
    pub date: NaiveDate,
    pub start: Minutes,
    pub customer_name: String,
    pub customer_phone: String,
    pub notes: Option<String>,
    /// Reference to an uploaded payment slip.
    pub slip_image: Option<String>,
    pub status: BookingStatus,
    pub channel: Channel,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn end(&self) -> Minutes {
        self.start + self.total_duration
    }

    pub fn time_label(&self) -> String {
        clock::minutes_to_time(self.start)
    }

    pub fn end_label(&self) -> String {
        clock::end_time_label(self.start, self.total_duration)
    }
}

/// Input for a new booking. Services are referenced by id and snapshotted
/// when the booking is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    pub service_ids: Vec<Ulid>,
    pub date: NaiveDate,
    /// `HH:mm`
    pub time: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub notes: Option<String>,
    pub slip_image: Option<String>,
    pub channel: Channel,
}

// ── Staff ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub id: Ulid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub role: StaffRole,
    pub salary_base: u32,
    pub commission_enabled: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffDraft {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub role: StaffRole,
    pub salary_base: u32,
    pub commission_enabled: bool,
}

/// Marks one staff member as off on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOff {
    pub staff_id: Ulid,
    pub date: NaiveDate,
    pub note: Option<String>,
}

// ── Journal records ──────────────────────────────────────────────

/// Store mutations — flat, no nesting. This is the journal record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    ServiceSaved {
        service: Service,
    },
    BookingCreated {
        booking: Booking,
    },
    BookingStatusChanged {
        id: Ulid,
        status: BookingStatus,
    },
    StaffSaved {
        staff: Staff,
    },
    DayOffAdded {
        day_off: DayOff,
    },
    DayOffRemoved {
        staff_id: Ulid,
        date: NaiveDate,
    },
}
