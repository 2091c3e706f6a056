//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use rainly_config::ConfigError;
use rainly_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not communicate with bridge at {address}: {reason}")]
    #[diagnostic(
        code(rainly::connection_failed),
        help(
            "Check that the bridge is powered and reachable on the local network.\n\
             Try: rainly discover"
        )
    )]
    ConnectionFailed { address: String, reason: String },

    #[error("Bridge at {address} did not answer within {timeout_ms}ms")]
    #[diagnostic(
        code(rainly::timeout),
        help("Increase the timeout with --timeout or check the bridge's responsiveness.")
    )]
    Timeout { address: String, timeout_ms: u64 },

    #[error("Request to {address} was interrupted")]
    #[diagnostic(code(rainly::interrupted))]
    Interrupted { address: String },

    #[error("Unexpected response from bridge: {message}")]
    #[diagnostic(code(rainly::invalid_response))]
    InvalidResponse { message: String },

    // ── Discovery ────────────────────────────────────────────────────
    #[error("Discovery failed: {message}")]
    #[diagnostic(
        code(rainly::discovery),
        help("UDP port 15900 must be free and broadcasts allowed on this interface.")
    )]
    Discovery { message: String },

    #[error("A discovery scan is already running")]
    #[diagnostic(code(rainly::scan_in_progress))]
    ScanInProgress,

    // ── Configuration ────────────────────────────────────────────────
    #[error("No bridge selected")]
    #[diagnostic(
        code(rainly::no_bridge),
        help(
            "Pass --host <address>, select a profile with --bridge <name>,\n\
             or set default_bridge in the config file.\n\
             Expected at: {path}"
        )
    )]
    NoBridge { path: String },

    #[error("Bridge profile '{name}' not found in configuration")]
    #[diagnostic(
        code(rainly::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Cannot reach bridge: {message}")]
    #[diagnostic(
        code(rainly::no_address),
        help("Set `host` on the profile or pass --host.")
    )]
    NoAddress { message: String },

    #[error(transparent)]
    #[diagnostic(code(rainly::config))]
    Config(ConfigError),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(rainly::validation))]
    Validation { field: String, reason: String },

    // ── Internal / IO / Serialization ────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(rainly::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(rainly::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(rainly::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Discovery { .. } | Self::NoAddress { .. } => {
                exit_code::CONNECTION
            }
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Interrupted { .. } => exit_code::INTERRUPTED,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Communication {
                address, reason, ..
            } => Self::ConnectionFailed { address, reason },
            CoreError::Timeout {
                address,
                timeout_ms,
            } => Self::Timeout {
                address,
                timeout_ms,
            },
            CoreError::Interrupted { address } => Self::Interrupted { address },
            CoreError::InvalidResponse { message } => Self::InvalidResponse { message },
            CoreError::ScanInProgress => Self::ScanInProgress,
            CoreError::Discovery { message } => Self::Discovery { message },
            CoreError::Config { message } => Self::NoAddress { message },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<rainly_api::Error> for CliError {
    fn from(err: rainly_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}
