// ── Core error types ──
//
// User-facing errors from rainly-core. Consumers never match on HTTP
// details directly; the `From<rainly_api::Error>` impl folds transport
// failures into connectivity-level variants.

use rainly_api::CommunicationCause;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connectivity ─────────────────────────────────────────────────
    #[error("Cannot communicate with bridge at {address}: {reason}")]
    Communication {
        address: String,
        reason: String,
        /// HTTP status, when the device answered with one.
        status: Option<u16>,
        #[source]
        source: Box<rainly_api::Error>,
    },

    #[error("Request to bridge at {address} was interrupted")]
    Interrupted { address: String },

    #[error("Bridge at {address} did not answer within {timeout_ms}ms")]
    Timeout { address: String, timeout_ms: u64 },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("Unexpected response from bridge: {message}")]
    InvalidResponse { message: String },

    // ── Discovery ────────────────────────────────────────────────────
    #[error("A discovery scan is already running")]
    ScanInProgress,

    #[error("Discovery failed: {message}")]
    Discovery { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether the failure says the bridge is unreachable right now.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Communication { .. } | Self::Interrupted { .. } | Self::Timeout { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<rainly_api::Error> for CoreError {
    fn from(err: rainly_api::Error) -> Self {
        match err {
            rainly_api::Error::Communication { address, cause } => match cause {
                CommunicationCause::Timeout { timeout_ms } => Self::Timeout {
                    address,
                    timeout_ms,
                },
                CommunicationCause::Interrupted => Self::Interrupted { address },
                CommunicationCause::Transport(ref e) if e.is_timeout() => Self::Timeout {
                    address,
                    timeout_ms: 0,
                },
                cause => {
                    let status = match &cause {
                        CommunicationCause::Status { status } => Some(*status),
                        _ => None,
                    };
                    Self::Communication {
                        address: address.clone(),
                        reason: cause.to_string(),
                        status,
                        source: Box::new(rainly_api::Error::Communication { address, cause }),
                    }
                }
            },
            rainly_api::Error::Deserialization { message, .. } => {
                Self::InvalidResponse { message }
            }
            rainly_api::Error::MalformedReply { reason } => Self::InvalidResponse { message: reason },
            rainly_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("invalid bridge address: {e}"),
            },
            rainly_api::Error::Tls(message) => Self::Config { message },
            rainly_api::Error::Discovery { action, source } => Self::Discovery {
                message: format!("{action}: {source}"),
            },
        }
    }
}
