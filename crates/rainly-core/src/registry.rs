// ── Zone subscriber registry ──
//
// Maps a zone uid to the single consumer interested in it. Registration
// replaces any previous subscriber for the same uid; entries are never
// removed. A zone without a subscriber is a normal, observable outcome.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use rainly_api::ZoneInfo;
use tokio::sync::mpsc;
use tracing::trace;

/// Receives updates for one zone.
pub trait ZoneSubscriber: Send + Sync {
    fn on_zone_update(&self, zone: &ZoneInfo);
}

impl<F> ZoneSubscriber for F
where
    F: Fn(&ZoneInfo) + Send + Sync,
{
    fn on_zone_update(&self, zone: &ZoneInfo) {
        self(zone);
    }
}

impl ZoneSubscriber for mpsc::UnboundedSender<ZoneInfo> {
    fn on_zone_update(&self, zone: &ZoneInfo) {
        if self.send(zone.clone()).is_err() {
            trace!(uid = zone.uid, "zone receiver dropped");
        }
    }
}

/// Outcome of delivering one zone update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Nobody registered for this zone; the update was dropped.
    NoSubscriber,
}

#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: DashMap<u32, Arc<dyn ZoneSubscriber>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber` for `uid`. Returns `true` if one was replaced.
    pub fn register(&self, uid: u32, subscriber: Arc<dyn ZoneSubscriber>) -> bool {
        self.subscribers.insert(uid, subscriber).is_some()
    }

    /// Hand `zone` to its subscriber.
    pub fn deliver(&self, zone: &ZoneInfo) -> Delivery {
        // Clone out of the map so the callback runs without a shard lock held.
        let subscriber = self
            .subscribers
            .get(&zone.uid)
            .map(|entry| Arc::clone(entry.value()));
        match subscriber {
            Some(subscriber) => {
                subscriber.on_zone_update(zone);
                Delivery::Delivered
            }
            None => Delivery::NoSubscriber,
        }
    }

    pub fn contains(&self, uid: u32) -> bool {
        self.subscribers.contains_key(&uid)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut uids: Vec<u32> = self.subscribers.iter().map(|e| *e.key()).collect();
        uids.sort_unstable();
        f.debug_struct("SubscriberRegistry")
            .field("zones", &uids)
            .finish()
    }
}
