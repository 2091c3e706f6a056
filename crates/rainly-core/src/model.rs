// ── Domain model ──
//
// Hardware classification and the records a discovery scan produces.

use rainly_api::DiscoveryReply;
use serde::{Serialize, Serializer};

const BRAND: &str = "RainMachine";

/// Controller hardware family, derived from the `hwVer` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum HardwareModel {
    #[strum(to_string = "Touch")]
    Touch,
    #[strum(to_string = "Mini-8")]
    Mini8,
    #[strum(to_string = "HD-12/16")]
    Hd,
    #[strum(to_string = "Pro-8/16")]
    Pro,
    /// Unrecognised or missing code.
    #[strum(to_string = "")]
    Unknown,
}

impl HardwareModel {
    pub fn from_code(code: Option<u32>) -> Self {
        match code {
            Some(1) => Self::Touch,
            Some(2) => Self::Mini8,
            Some(3) => Self::Hd,
            Some(5) => Self::Pro,
            _ => Self::Unknown,
        }
    }

    /// Number of zones the hardware drives (16 when unknown).
    pub fn zone_count(self) -> u32 {
        match self {
            Self::Touch | Self::Mini8 => 8,
            Self::Hd | Self::Pro | Self::Unknown => 16,
        }
    }
}

impl Serialize for HardwareModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Derive a stable bridge id from a MAC: keep `[A-Za-z0-9_-]`, lowercase.
pub fn sanitize_id(mac: &str) -> String {
    mac.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// A controller found by a discovery scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredBridge {
    pub bridge_id: String,
    pub label: String,
    pub host: String,
    pub mac: String,
    pub name: String,
    pub model: HardwareModel,
    pub zone_count: u32,
}

impl DiscoveredBridge {
    pub fn new(reply: &DiscoveryReply, model: HardwareModel) -> Self {
        Self {
            bridge_id: sanitize_id(&reply.mac),
            label: format!("{BRAND} {model}: {}", reply.name),
            host: reply.address.clone(),
            mac: reply.mac.clone(),
            name: reply.name.clone(),
            model,
            zone_count: model.zone_count(),
        }
    }

    /// Zone records `1..=zone_count` belonging to this bridge.
    ///
    /// The uid equals the zone number in `zone_id`, with no `+ 1` offset.
    pub fn zones(&self) -> impl Iterator<Item = DiscoveredZone> + '_ {
        (1..=self.zone_count).map(move |uid| DiscoveredZone {
            bridge_id: self.bridge_id.clone(),
            zone_id: format!("zone{uid}"),
            uid,
            label: format!("{} (Zone {uid})", self.label),
        })
    }
}

/// One zone slot of a discovered controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredZone {
    pub bridge_id: String,
    pub zone_id: String,
    pub uid: u32,
    pub label: String,
}

/// A record emitted by a discovery scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscoveredThing {
    Bridge(DiscoveredBridge),
    Zone(DiscoveredZone),
}
