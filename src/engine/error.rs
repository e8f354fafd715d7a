use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::{BookingStatus, Minutes};

#[derive(Debug)]
pub enum EngineError {
    NotFound(Ulid),
    AlreadyExists(Ulid),
    InvalidTimeFormat(String),
    InvalidDuration(Minutes),
    InvalidSlotInterval(Minutes),
    InvalidWindow {
        from: String,
        to: String,
    },
    NoServices,
    MixedZones,
    InactiveService(Ulid),
    InvalidCustomer(&'static str),
    /// A service or staff record without a name.
    MissingName(&'static str),
    InvalidPhone(String),
    OutsideBookingHorizon(NaiveDate),
    SlotUnavailable {
        date: NaiveDate,
        time: String,
    },
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    LimitExceeded(&'static str),
    Store(String),
}

impl EngineError {
    /// Failures the user can resolve by trying again, possibly with another slot.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::SlotUnavailable { .. } | EngineError::Store(_))
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            EngineError::InvalidTimeFormat(s) => write!(f, "invalid time {s:?}: expected HH:mm"),
            EngineError::InvalidDuration(d) => write!(f, "invalid duration: {d} minutes"),
            EngineError::InvalidSlotInterval(i) => {
                write!(f, "invalid slot interval: {i} minutes")
            }
            EngineError::InvalidWindow { from, to } => {
                write!(f, "invalid availability window: {from} - {to}")
            }
            EngineError::NoServices => write!(f, "no services selected"),
            EngineError::MixedZones => {
                write!(f, "selected services belong to different zones")
            }
            EngineError::InactiveService(id) => write!(f, "service is not bookable: {id}"),
            EngineError::InvalidCustomer(msg) => write!(f, "invalid customer details: {msg}"),
            EngineError::MissingName(kind) => write!(f, "{kind} name is required"),
            EngineError::InvalidPhone(p) => write!(f, "invalid phone number: {p}"),
            EngineError::OutsideBookingHorizon(date) => {
                write!(f, "date {date} is outside the booking horizon")
            }
            EngineError::SlotUnavailable { date, time } => {
                write!(f, "slot {date} {time} is no longer available, please choose another time")
            }
            EngineError::InvalidTransition { from, to } => {
                write!(f, "cannot change booking status from {from} to {to}")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
