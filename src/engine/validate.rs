use crate::clock;
use crate::limits::*;
use crate::model::*;

use super::EngineError;

/// The single zone shared by every selected service.
pub fn zone_of(services: &[Service]) -> Result<Zone, EngineError> {
    let first = services.first().ok_or(EngineError::NoServices)?;
    if services.iter().any(|s| s.zone != first.zone) {
        return Err(EngineError::MixedZones);
    }
    Ok(first.zone)
}

/// Sum of the service durations.
pub fn total_duration(services: &[Service]) -> Result<Minutes, EngineError> {
    let mut total: Minutes = 0;
    for s in services {
        if s.duration <= 0 {
            return Err(EngineError::InvalidDuration(s.duration));
        }
        total += s.duration;
    }
    if total > MAX_TOTAL_DURATION {
        return Err(EngineError::LimitExceeded("total duration too long"));
    }
    Ok(total)
}

/// Checks on a draft that need no store access.
pub fn check_booking_draft(draft: &BookingDraft) -> Result<(), EngineError> {
    if draft.service_ids.is_empty() {
        return Err(EngineError::NoServices);
    }
    if draft.service_ids.len() > MAX_SERVICES_PER_BOOKING {
        return Err(EngineError::LimitExceeded("too many services in one booking"));
    }
    clock::time_to_minutes(&draft.time)?;
    if draft.customer_name.trim().is_empty() {
        return Err(EngineError::InvalidCustomer("name is required"));
    }
    if draft.customer_name.len() > MAX_NAME_LEN {
        return Err(EngineError::LimitExceeded("customer name too long"));
    }
    if draft.customer_phone.trim().is_empty() {
        return Err(EngineError::InvalidCustomer("phone is required"));
    }
    if let Some(ref notes) = draft.notes
        && notes.len() > MAX_NOTES_LEN
    {
        return Err(EngineError::LimitExceeded("notes too long"));
    }
    if let Some(ref slip) = draft.slip_image
        && slip.len() > MAX_SLIP_REF_LEN
    {
        return Err(EngineError::LimitExceeded("slip reference too long"));
    }
    Ok(())
}

/// Parsed `(available_from, available_to)` of a catalog draft.
pub fn check_service_draft(draft: &ServiceDraft) -> Result<(Minutes, Minutes), EngineError> {
    if draft.name.trim().is_empty() {
        return Err(EngineError::MissingName("service"));
    }
    if draft.name.len() > MAX_NAME_LEN {
        return Err(EngineError::LimitExceeded("service name too long"));
    }
    if draft.duration <= 0 {
        return Err(EngineError::InvalidDuration(draft.duration));
    }
    if draft.duration > MAX_TOTAL_DURATION {
        return Err(EngineError::LimitExceeded("service duration too long"));
    }
    let from = clock::time_to_minutes(&draft.available_from)?;
    let to = clock::time_to_minutes(&draft.available_to)?;
    if from >= to {
        return Err(EngineError::InvalidWindow {
            from: draft.available_from.clone(),
            to: draft.available_to.clone(),
        });
    }
    Ok((from, to))
}

pub fn check_staff_draft(draft: &StaffDraft) -> Result<(), EngineError> {
    if draft.name.trim().is_empty() {
        return Err(EngineError::MissingName("staff"));
    }
    if draft.name.len() > MAX_NAME_LEN {
        return Err(EngineError::LimitExceeded("staff name too long"));
    }
    if let Some(ref email) = draft.email
        && email.len() > MAX_EMAIL_LEN
    {
        return Err(EngineError::LimitExceeded("email too long"));
    }
    Ok(())
}

/// Thai mobile number: ten digits starting with 06, 08 or 09.
/// Separators such as dashes and spaces are ignored.
pub fn is_valid_thai_phone(phone: &str) -> bool {
    let digits: Vec<u8> = phone.bytes().filter(u8::is_ascii_digit).collect();
    digits.len() == 10 && digits[0] == b'0' && matches!(digits[1], b'6' | b'8' | b'9')
}
