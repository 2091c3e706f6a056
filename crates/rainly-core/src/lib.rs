//! Polling, caching and discovery for irrigation controllers.
//!
//! Sits between `rainly-api` (wire protocol) and the CLI:
//!
//! - **[`BridgeController`]**: per-bridge poll coordinator. Checks the
//!   bridge once on [`activate()`](BridgeController::activate), then runs a
//!   fixed-delay refresh loop that reads diagnostics and device info,
//!   refreshes zone state through a TTL-bounded [`ZoneCache`], and fans
//!   zone updates out through the [`SubscriberRegistry`]. Status and
//!   properties are published on `tokio::sync::watch` channels.
//!
//! - **[`DiscoveryListener`]**: UDP broadcast scan plus per-responder
//!   hardware classification, yielding [`DiscoveredThing`] records.
//!
//! - **[`AddressCache`]**: process-wide id → host map fed by service
//!   advertisements, read through the [`AddressLookup`] trait.
//!
//! Devices are reached through the [`BridgeApi`] and [`VersionProbe`]
//! traits so the coordination logic can run against scripted fakes.

pub mod address;
pub mod api;
pub mod cache;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod model;
pub mod registry;

// ── Primary re-exports ──────────────────────────────────────────────
pub use address::{AddressCache, AddressLookup, Advertisement};
pub use api::{BridgeApi, HttpVersionProbe, VersionProbe};
pub use cache::ZoneCache;
pub use config::{BridgeConfig, ScanOptions, TlsVerification};
pub use controller::{BridgeController, BridgeProperties, BridgeStatus, CycleReport};
pub use discovery::DiscoveryListener;
pub use error::CoreError;
pub use model::{DiscoveredBridge, DiscoveredThing, DiscoveredZone, HardwareModel, sanitize_id};
pub use registry::{Delivery, SubscriberRegistry, ZoneSubscriber};

// Wire types consumers handle directly.
pub use rainly_api::{ApiVersion, DeviceInfo, Diagnostics, ZoneInfo, ZonesSnapshot};
