use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `rainly-api` crate.
///
/// Every network-level failure of a device exchange (timeout, transport
/// failure, non-200 status, interruption) is folded into a single
/// [`Communication`](Self::Communication) variant that keeps the
/// originating [`CommunicationCause`]. `rainly-core` maps these into
/// connectivity decisions.
#[derive(Debug, Error)]
pub enum Error {
    // ── Device exchange ─────────────────────────────────────────────
    /// The HTTP exchange with the device did not complete.
    #[error("Communication with {address} failed: {cause}")]
    Communication {
        address: String,
        #[source]
        cause: CommunicationCause,
    },

    // ── Transport setup ─────────────────────────────────────────────
    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or HTTP client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A discovery datagram that does not follow the `A||B||C||D` layout.
    #[error("Malformed discovery reply: {reason}")]
    MalformedReply { reason: String },

    // ── Discovery ───────────────────────────────────────────────────
    /// Socket setup for a discovery scan failed (bind, broadcast flag, send).
    #[error("Discovery {action} failed: {source}")]
    Discovery {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Why a device exchange failed.
#[derive(Debug, Error)]
pub enum CommunicationCause {
    /// No complete response within the request timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Connection refused, DNS failure, TLS handshake, reset, etc.
    #[error("HTTP transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The device answered with something other than `200 OK`.
    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    /// The client was closed while the request was in flight.
    #[error("request interrupted")]
    Interrupted,
}

impl CommunicationCause {
    pub(crate) fn timeout(timeout: Duration) -> Self {
        Self::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl Error {
    /// Returns `true` for any failed device exchange.
    pub fn is_communication(&self) -> bool {
        matches!(self, Self::Communication { .. })
    }

    /// Returns `true` if the exchange was cut short by [`close()`](crate::DeviceClient::close).
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            Self::Communication {
                cause: CommunicationCause::Interrupted,
                ..
            }
        )
    }

    /// Returns `true` if the exchange hit the request timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Communication { cause, .. } => match cause {
                CommunicationCause::Timeout { .. } => true,
                CommunicationCause::Transport(e) => e.is_timeout(),
                _ => false,
            },
            _ => false,
        }
    }

    /// The HTTP status the device answered with, when that was the failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Communication {
                cause: CommunicationCause::Status { status },
                ..
            } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn communication(cause: CommunicationCause) -> Error {
        Error::Communication {
            address: "192.168.1.50".into(),
            cause,
        }
    }

    #[test]
    fn interrupted_is_communication() {
        let err = communication(CommunicationCause::Interrupted);
        assert!(err.is_communication());
        assert!(err.is_interrupted());
        assert!(!err.is_timeout());
    }

    #[test]
    fn timeout_reports_millis() {
        let err = communication(CommunicationCause::timeout(Duration::from_secs(3)));
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "Communication with 192.168.1.50 failed: request timed out after 3000ms"
        );
    }

    #[test]
    fn status_is_exposed() {
        let err = communication(CommunicationCause::Status { status: 503 });
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_interrupted());
    }

    #[test]
    fn malformed_reply_is_not_communication() {
        let err = Error::MalformedReply {
            reason: "expected 4 fields, got 1".into(),
        };
        assert!(!err.is_communication());
        assert_eq!(err.status(), None);
    }
}
