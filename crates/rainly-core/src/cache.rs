// ── Zone cache ──
//
// Holds the last zone snapshot together with the monotonic instant it
// was fetched. Uses tokio's clock so paused-time tests control staleness.

use std::time::Duration;

use rainly_api::{ZoneInfo, ZonesSnapshot};
use tokio::time::Instant;

#[derive(Debug)]
struct CachedZones {
    snapshot: ZonesSnapshot,
    fetched_at: Instant,
}

/// Time-bounded cache of one bridge's zone state.
#[derive(Debug)]
pub struct ZoneCache {
    ttl: Duration,
    entry: Option<CachedZones>,
}

impl ZoneCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// True when nothing is cached or the cached data is older than the TTL.
    pub fn is_stale(&self) -> bool {
        self.entry
            .as_ref()
            .is_none_or(|entry| entry.fetched_at.elapsed() > self.ttl)
    }

    /// Replace the cached snapshot and restart the TTL.
    pub fn store(&mut self, snapshot: ZonesSnapshot) {
        self.entry = Some(CachedZones {
            snapshot,
            fetched_at: Instant::now(),
        });
    }

    pub fn snapshot(&self) -> Option<&ZonesSnapshot> {
        self.entry.as_ref().map(|entry| &entry.snapshot)
    }

    /// Cached zones, empty when nothing has been fetched.
    pub fn zones(&self) -> &[ZoneInfo] {
        self.entry
            .as_ref()
            .map_or(&[], |entry| entry.snapshot.zones.as_slice())
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}
