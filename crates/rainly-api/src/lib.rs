//! Async Rust client for irrigation controllers.
//!
//! Two surfaces:
//!
//! - [`DeviceClient`]: the HTTPS device API under `/api/4/` with password
//!   login and an access token appended to every authenticated request.
//! - [`BroadcastProbe`]: UDP broadcast discovery of controllers on the
//!   local segment.
//!
//! Connectivity decisions (polling, caching, status) live in `rainly-core`.

pub mod auth;
pub mod client;
pub mod discovery;
pub mod error;
pub mod models;
mod system;
pub mod transport;
mod zones;

pub use auth::LoginOutcome;
pub use client::DeviceClient;
pub use discovery::{BroadcastProbe, DiscoveryReply, ProbeConfig};
pub use error::{CommunicationCause, Error};
pub use models::{ApiVersion, DeviceInfo, Diagnostics, ZoneInfo, ZonesSnapshot};
pub use transport::{TlsMode, TransportConfig};
