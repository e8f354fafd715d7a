//! Runtime settings, read from `BLISS_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::clock::{self, SlotGrid, DEFAULT_CLOSE, DEFAULT_OPEN, DEFAULT_SLOT_INTERVAL};
use crate::model::{Minutes, Zone};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub metrics_port: Option<u16>,
    /// Journal appends that trigger a compaction.
    pub compact_threshold: u64,
    /// Operating grid used by the slot board.
    pub grid: SlotGrid,
    /// Capacity for a zone whose staff roster is empty.
    pub hair_capacity: u32,
    pub nail_capacity: u32,
    /// Online bookings are accepted for today and this many days minus one ahead.
    pub horizon_days: u32,
    /// Same-day online bookings must start at least this many minutes from now.
    pub same_day_lead: Minutes,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            metrics_port: None,
            compact_threshold: 1000,
            grid: SlotGrid::default(),
            hair_capacity: Zone::Hair.default_capacity(),
            nail_capacity: Zone::Nail.default_capacity(),
            horizon_days: 14,
            same_day_lead: 30,
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.parse().ok())
}

fn clock_time(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: Minutes) -> Minutes {
    match lookup(key) {
        None => default,
        Some(s) => clock::time_to_minutes(&s).unwrap_or_else(|e| {
            warn!("{key}: {e}, using {}", clock::minutes_to_time(default));
            default
        }),
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key/value source. Unset or unparsable values
    /// keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let open = clock_time(&lookup, "BLISS_OPEN", DEFAULT_OPEN);
        let close = clock_time(&lookup, "BLISS_CLOSE", DEFAULT_CLOSE);
        let interval = match parsed(&lookup, "BLISS_SLOT_INTERVAL") {
            Some(i) if i > 0 => i,
            None => DEFAULT_SLOT_INTERVAL,
            Some(i) => {
                warn!("BLISS_SLOT_INTERVAL: {i} is not positive, using {DEFAULT_SLOT_INTERVAL}");
                DEFAULT_SLOT_INTERVAL
            }
        };
        // Hours and interval fall back independently.
        let grid = match SlotGrid::new(open, close, interval) {
            Ok(grid) if grid.span().is_some() => grid,
            Ok(_) => {
                warn!("BLISS_OPEN must be before BLISS_CLOSE, using the default hours");
                SlotGrid { open: DEFAULT_OPEN, close: DEFAULT_CLOSE, interval }
            }
            Err(e) => {
                warn!("slot grid: {e}, using the default grid");
                SlotGrid::default()
            }
        };

        Self {
            data_dir: lookup("BLISS_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            metrics_port: parsed(&lookup, "BLISS_METRICS_PORT"),
            compact_threshold: parsed(&lookup, "BLISS_COMPACT_THRESHOLD")
                .unwrap_or(defaults.compact_threshold),
            grid,
            hair_capacity: parsed(&lookup, "BLISS_HAIR_CAPACITY").unwrap_or(defaults.hair_capacity),
            nail_capacity: parsed(&lookup, "BLISS_NAIL_CAPACITY").unwrap_or(defaults.nail_capacity),
            horizon_days: parsed(&lookup, "BLISS_HORIZON_DAYS").unwrap_or(defaults.horizon_days),
            same_day_lead: parsed(&lookup, "BLISS_SAME_DAY_LEAD").unwrap_or(defaults.same_day_lead),
        }
    }

    pub fn fallback_capacity(&self, zone: Zone) -> u32 {
        match zone {
            Zone::Hair => self.hair_capacity,
            Zone::Nail => self.nail_capacity,
        }
    }

    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join("bliss.wal")
    }
}
