// ── Runtime configuration ──
//
// These types describe how to talk to one bridge and how to scan for
// bridges. They carry credentials and timing, but never touch disk; the
// CLI builds them from its profile file and flags.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::time::Duration;

use rainly_api::discovery::{PROBE_PORT, REPLY_PORT};
use rainly_api::{ProbeConfig, TlsMode, TransportConfig};
use secrecy::SecretString;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Bridges ship self-signed certificates.
    #[default]
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Configuration for one managed bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Stable bridge identifier (sanitized MAC or advertised serial).
    pub id: String,
    /// Host address. When absent the last advertised address is used.
    pub host: Option<String>,
    /// Device password. Empty means unauthenticated mode.
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Delay between the end of one refresh cycle and the start of the next.
    pub refresh_interval: Duration,
    /// How long fetched zone data is reused before refetching.
    pub zone_cache_ttl: Duration,
    /// Consecutive failed cycles before the bridge is reported offline.
    pub offline_after_failures: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            host: None,
            password: SecretString::from(String::new()),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(3),
            refresh_interval: Duration::from_secs(60),
            zone_cache_ttl: Duration::from_millis(3000),
            offline_after_failures: 3,
        }
    }
}

impl BridgeConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
        }
    }
}

/// Parameters for a discovery scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Local address the reply socket binds to.
    pub bind: SocketAddr,
    /// Destination of the broadcast probe.
    pub probe_target: SocketAddr,
    /// End the scan after this long without a reply.
    pub idle_timeout: Duration,
    /// Upper bound on reply collection.
    pub window: Duration,
    /// Timeout of the per-responder version request.
    pub probe_timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            bind: SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, REPLY_PORT).into(),
            probe_target: SocketAddrV4::new(Ipv4Addr::BROADCAST, PROBE_PORT).into(),
            idle_timeout: Duration::from_millis(80),
            window: Duration::from_secs(15),
            probe_timeout: Duration::from_secs(3),
        }
    }
}

impl ScanOptions {
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            bind: self.bind,
            target: self.probe_target,
            idle_timeout: self.idle_timeout,
            window: self.window,
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig::default().with_timeout(self.probe_timeout)
    }
}
