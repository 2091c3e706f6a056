// Device API response types
//
// Version and zone payloads are strongly typed. Provisioning and
// diagnostics vary by firmware, so they are kept as JSON maps with a few
// typed accessors for the fields the controller actually reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Response of `GET apiVer`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVersion {
    #[serde(default, deserialize_with = "string_or_number")]
    pub api_ver: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub hw_ver: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub sw_ver: String,
}

impl ApiVersion {
    /// Hardware code as an integer, when `hwVer` is numeric.
    pub fn hardware_code(&self) -> Option<u32> {
        self.hw_ver.trim().parse().ok()
    }
}

/// One irrigation zone as reported by `GET zone`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZoneInfo {
    pub uid: u32,
    pub name: String,
    pub state: i32,
    pub active: bool,
    pub user_duration: i64,
    pub machine_duration: i64,
    pub remaining: i64,
    pub cycle: i32,
    pub no_of_cycles: i32,
    pub restriction: bool,
    #[serde(rename = "type")]
    pub zone_type: i32,
    pub master: bool,
}

/// Wire envelope of `GET zone`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ZonesResponse {
    #[serde(default)]
    pub zones: Vec<ZoneInfo>,
}

/// All zones of a device, captured at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ZonesSnapshot {
    pub zones: Vec<ZoneInfo>,
    pub fetched_at: DateTime<Utc>,
}

impl ZonesSnapshot {
    pub fn new(zones: Vec<ZoneInfo>) -> Self {
        Self {
            zones,
            fetched_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn zone(&self, uid: u32) -> Option<&ZoneInfo> {
        self.zones.iter().find(|z| z.uid == uid)
    }
}

/// Response of `GET provision`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DeviceInfo {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The rain-sensor start marker, if the device reports one.
    ///
    /// Newer firmware nests it under `system`; both places are checked.
    pub fn rain_sensor_rain_start(&self) -> Option<String> {
        const KEY: &str = "rainSensorRainStart";
        self.fields
            .get(KEY)
            .or_else(|| self.fields.get("system")?.get(KEY))
            .and_then(value_as_text)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Response of `GET diag`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Diagnostics {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Device uptime rendered as text (the device reports `H:MM:SS` or seconds).
    pub fn uptime(&self) -> Option<String> {
        self.fields.get("uptime").and_then(value_as_text)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Render a scalar JSON value as text; `null` and empty strings become `None`.
fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}
