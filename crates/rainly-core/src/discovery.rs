// ── Discovery listener ──
//
// Runs a broadcast scan, classifies each responder by its hardware code
// and emits one bridge record plus one record per zone slot. Only one
// scan runs at a time per listener.

use std::collections::HashSet;

use futures_util::future::join_all;
use rainly_api::{BroadcastProbe, DiscoveryReply};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::api::{HttpVersionProbe, VersionProbe};
use crate::config::ScanOptions;
use crate::error::CoreError;
use crate::model::{DiscoveredBridge, DiscoveredThing, HardwareModel, sanitize_id};

pub struct DiscoveryListener<P = HttpVersionProbe> {
    probe: BroadcastProbe,
    versions: P,
    scan_lock: Mutex<()>,
}

impl DiscoveryListener<HttpVersionProbe> {
    /// Listener that classifies responders over HTTPS.
    pub fn new(options: &ScanOptions) -> Self {
        Self::with_probe(options, HttpVersionProbe::new(options.transport()))
    }
}

impl<P: VersionProbe> DiscoveryListener<P> {
    pub fn with_probe(options: &ScanOptions, versions: P) -> Self {
        Self {
            probe: BroadcastProbe::new(options.probe_config()),
            versions,
            scan_lock: Mutex::new(()),
        }
    }

    /// Scan the local segment once.
    ///
    /// Returns [`CoreError::ScanInProgress`] if another scan on this
    /// listener has not finished. Responders whose classification fails
    /// are still reported with the default model and zone count.
    pub async fn scan(&self) -> Result<Vec<DiscoveredThing>, CoreError> {
        let Ok(_guard) = self.scan_lock.try_lock() else {
            return Err(CoreError::ScanInProgress);
        };

        debug!("discovery scan starting");
        let replies = dedupe(self.probe.run().await?);
        if replies.is_empty() {
            info!("discovery scan received no responses");
            return Ok(Vec::new());
        }

        let bridges = join_all(replies.iter().map(|reply| self.classify(reply))).await;
        info!(bridges = bridges.len(), "discovery scan complete");

        let mut things = Vec::new();
        for bridge in bridges {
            let zones: Vec<_> = bridge.zones().map(DiscoveredThing::Zone).collect();
            things.push(DiscoveredThing::Bridge(bridge));
            things.extend(zones);
        }
        Ok(things)
    }

    async fn classify(&self, reply: &DiscoveryReply) -> DiscoveredBridge {
        let model = match self.versions.probe_version(&reply.address).await {
            Ok(version) => HardwareModel::from_code(version.hardware_code()),
            Err(e) => {
                debug!(address = %reply.address, error = %e, "classification failed, using defaults");
                HardwareModel::Unknown
            }
        };
        debug!(address = %reply.address, %model, "responder classified");
        DiscoveredBridge::new(reply, model)
    }
}

/// Keep the first reply per bridge id.
fn dedupe(replies: Vec<DiscoveryReply>) -> Vec<DiscoveryReply> {
    let mut seen = HashSet::new();
    replies
        .into_iter()
        .filter(|reply| seen.insert(sanitize_id(&reply.mac)))
        .collect()
}
