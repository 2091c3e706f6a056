// ── Advertised address cache ──
//
// Service advertisements (mDNS) give each controller's serial and IPv4
// address. The cache keeps the last one seen per id so a bridge without a
// configured host can still be reached.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

/// Service type controllers advertise under.
pub const SERVICE_TYPE: &str = "_hap._tcp.local";

const SERVICE_NAME_MARKER: &str = "rainmachine";
const ID_PROPERTY: &str = "id";

/// Read side of the address cache.
pub trait AddressLookup: Send + Sync {
    /// Last host address advertised for `id`, if any.
    fn last_known_address(&self, id: &str) -> Option<String>;
}

/// Process-wide id → host map, safe for concurrent readers and writers.
///
/// Cloning is cheap; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct AddressCache {
    hosts: Arc<DashMap<String, String>>,
}

impl AddressCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `host` for `id`, returning the address it replaced.
    pub fn record(&self, id: impl Into<String>, host: impl Into<String>) -> Option<String> {
        let id = id.into();
        let host = host.into();
        debug!(%id, %host, "recording advertised address");
        self.hosts.insert(id, host)
    }

    /// Filter an advertisement and record it when it describes a controller.
    pub fn ingest(&self, advertisement: &Advertisement) -> Option<(String, String)> {
        let (id, host) = advertisement.accept()?;
        self.record(id.clone(), host.clone());
        Some((id, host))
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl AddressLookup for AddressCache {
    fn last_known_address(&self, id: &str) -> Option<String> {
        self.hosts.get(id).map(|entry| entry.value().clone())
    }
}

/// One resolved service advertisement.
#[derive(Debug, Clone, Default)]
pub struct Advertisement {
    pub service_type: String,
    pub name: String,
    pub ipv4: Vec<Ipv4Addr>,
    pub properties: HashMap<String, String>,
}

impl Advertisement {
    /// The `(id, host)` pair to record, if this is a controller advertisement.
    ///
    /// Requires the controller service type, a name containing
    /// `rainmachine`, at least one IPv4 address and an `id` property.
    pub fn accept(&self) -> Option<(String, String)> {
        if !self.name.contains(SERVICE_NAME_MARKER) {
            trace!(name = %self.name, "advertisement is not a controller");
            return None;
        }
        if self.service_type.trim_end_matches('.') != SERVICE_TYPE {
            trace!(service = %self.service_type, "unexpected service type");
            return None;
        }
        let Some(address) = self.ipv4.first() else {
            debug!(name = %self.name, "controller advertised without an IPv4 address");
            return None;
        };
        let Some(id) = self.properties.get(ID_PROPERTY) else {
            debug!(name = %self.name, "controller advertised without an id");
            return None;
        };
        Some((id.clone(), address.to_string()))
    }
}
