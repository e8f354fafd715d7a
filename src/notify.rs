use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::{Event, Zone};

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast of booking events per zone. Open slot boards subscribe and
/// refresh their grid when something lands in their zone.
pub struct NotifyHub {
    channels: DashMap<Zone, broadcast::Sender<Event>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to a zone. Creates the channel if needed.
    pub fn subscribe(&self, zone: Zone) -> broadcast::Receiver<Event> {
        let sender = self
            .channels
            .entry(zone)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send a notification. No-op if nobody is listening.
    pub fn send(&self, zone: Zone, event: &Event) {
        if let Some(sender) = self.channels.get(&zone) {
            let _ = sender.send(event.clone());
        }
    }
}
