//! Input size limits enforced before anything is written.

pub const MAX_SERVICES_PER_BOOKING: usize = 10;
pub const MAX_NAME_LEN: usize = 200;
pub const MAX_NOTES_LEN: usize = 2_000;
pub const MAX_NOTE_LEN: usize = 500;
/// Slip references are URLs or storage keys, not inline image data.
pub const MAX_SLIP_REF_LEN: usize = 2_048;
pub const MAX_EMAIL_LEN: usize = 320;
pub const MAX_SERVICES_PER_ZONE: usize = 200;
pub const MAX_STAFF: usize = 500;
/// Longest single appointment the grid will consider (12h).
pub const MAX_TOTAL_DURATION: i32 = 12 * 60;
