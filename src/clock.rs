use chrono::{NaiveTime, Timelike};

use crate::engine::EngineError;
use crate::model::{Minutes, Span};

pub const MINUTES_PER_DAY: Minutes = 24 * 60;

/// Default first slot of the operating grid (08:00).
pub const DEFAULT_OPEN: Minutes = 8 * 60;
/// Default end of the operating grid (22:00, exclusive).
pub const DEFAULT_CLOSE: Minutes = 22 * 60;
pub const DEFAULT_SLOT_INTERVAL: Minutes = 30;

/// Parse a zero-padded 24-hour `HH:mm` label into minutes since midnight.
pub fn time_to_minutes(time: &str) -> Result<Minutes, EngineError> {
    let bytes = time.as_bytes();
    let well_formed = bytes.len() == 5
        && bytes[2] == b':'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || b.is_ascii_digit());
    if !well_formed {
        return Err(EngineError::InvalidTimeFormat(time.to_string()));
    }
    let parsed = NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| EngineError::InvalidTimeFormat(time.to_string()))?;
    Ok((parsed.hour() * 60 + parsed.minute()) as Minutes)
}

/// Format minutes since midnight as `HH:mm`. No wraparound: callers normalize
/// values past midnight before display.
pub fn minutes_to_time(minutes: Minutes) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// End-of-appointment label, wrapped into the 24h clock.
pub fn end_time_label(start: Minutes, duration: Minutes) -> String {
    minutes_to_time((start + duration).rem_euclid(MINUTES_PER_DAY))
}

/// Half-open overlap test: touching endpoints do not overlap.
pub fn intervals_overlap(
    start_a: Minutes,
    end_a: Minutes,
    start_b: Minutes,
    end_b: Minutes,
) -> bool {
    start_a < end_b && end_a > start_b
}

/// Minutes since midnight of a wall-clock time.
pub fn minutes_of(time: NaiveTime) -> Minutes {
    (time.hour() * 60 + time.minute()) as Minutes
}

/// Candidate start times `open, open + interval, ...` strictly before `close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGrid {
    pub open: Minutes,
    pub close: Minutes,
    pub interval: Minutes,
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self {
            open: DEFAULT_OPEN,
            close: DEFAULT_CLOSE,
            interval: DEFAULT_SLOT_INTERVAL,
        }
    }
}

impl SlotGrid {
    pub fn new(open: Minutes, close: Minutes, interval: Minutes) -> Result<Self, EngineError> {
        if interval <= 0 {
            return Err(EngineError::InvalidSlotInterval(interval));
        }
        Ok(Self { open, close, interval })
    }

    /// The default 08:00–22:00 grid at a custom granularity.
    pub fn with_interval(interval: Minutes) -> Result<Self, EngineError> {
        Self::new(DEFAULT_OPEN, DEFAULT_CLOSE, interval)
    }

    pub fn starts(&self) -> impl Iterator<Item = Minutes> {
        let (open, close) = (self.open, self.close);
        // Fields are public: never step by zero.
        let step = self.interval.max(1) as usize;
        (open..close).step_by(step)
    }

    pub fn labels(&self) -> Vec<String> {
        self.starts().map(minutes_to_time).collect()
    }

    pub fn span(&self) -> Option<Span> {
        (self.open < self.close).then(|| Span::new(self.open, self.close))
    }
}
