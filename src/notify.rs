use dashmap::DashMap;
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::model::Change;

const CHANNEL_CAPACITY: usize = 256;

/// Per-resource change feed. UI shells subscribe to the rows they show and
/// re-render when a change arrives.
pub struct ChangeHub {
    channels: DashMap<Ulid, broadcast::Sender<Change>>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to one resource. Creates the channel if needed.
    pub fn subscribe(&self, resource_id: Ulid) -> broadcast::Receiver<Change> {
        self.channels
            .entry(resource_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// No-op if nobody is listening.
    pub fn send(&self, resource_id: Ulid, change: &Change) {
        if let Some(sender) = self.channels.get(&resource_id) {
            let _ = sender.send(change.clone());
        }
    }

    pub fn remove(&self, resource_id: &Ulid) {
        self.channels.remove(resource_id);
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
