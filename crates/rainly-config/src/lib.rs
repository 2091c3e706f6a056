//! Configuration for the rainly CLI.
//!
//! TOML bridge profiles, password resolution (env var, keyring,
//! plaintext) and translation to `rainly_core::BridgeConfig` /
//! `rainly_core::ScanOptions`. The CLI layers flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use rainly_core::{BridgeConfig, ScanOptions, TlsVerification};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Keyring service name; entries are keyed `<profile>/password`.
pub const KEYRING_SERVICE: &str = "rainly";

/// Environment prefix for config overrides (`RAINLY_DEFAULTS__TIMEOUT=5`).
pub const ENV_PREFIX: &str = "RAINLY_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no bridge profile named '{profile}'")]
    UnknownProfile { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--bridge` is not given.
    pub default_bridge: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named bridge profiles.
    #[serde(default)]
    pub bridges: HashMap<String, BridgeProfile>,

    #[serde(default)]
    pub discovery: DiscoverySettings,
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    ///
    /// Returns `Ok(None)` when no name was asked for and no default exists.
    pub fn profile(&self, name: Option<&str>) -> Result<Option<(String, &BridgeProfile)>, ConfigError> {
        let Some(name) = name.or(self.default_bridge.as_deref()) else {
            return Ok(None);
        };
        self.bridges
            .get(name)
            .map(|profile| Some((name.to_owned(), profile)))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.to_owned(),
            })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Refresh interval in seconds.
    #[serde(default = "default_refresh")]
    pub refresh: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            refresh: default_refresh(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    3
}
fn default_refresh() -> u64 {
    60
}

/// A named bridge profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BridgeProfile {
    /// Host address (IP or hostname, optional scheme).
    pub host: Option<String>,

    /// Bridge id (sanitized MAC). Used to find an advertised address when
    /// `host` is absent.
    pub id: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name holding the password.
    pub password_env: Option<String>,

    /// Override refresh interval (seconds).
    pub refresh: Option<u64>,

    /// Override request timeout (seconds).
    pub timeout: Option<u64>,

    /// Accept self-signed certificates (default true).
    pub insecure: Option<bool>,

    /// Path to a CA certificate for strict TLS.
    pub ca_cert: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DiscoverySettings {
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            idle_timeout_ms: default_idle_timeout_ms(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_idle_timeout_ms() -> u64 {
    80
}
fn default_window_secs() -> u64 {
    15
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "rainly", "rainly").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("rainly");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load the config from the canonical path plus `RAINLY_` env vars.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` plus `RAINLY_` env vars. A missing file
/// yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    Ok(config)
}

/// Serialize config to TOML at the canonical path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

// ── Password resolution ─────────────────────────────────────────────

/// Resolve a profile's password: `password_env`, then the system keyring,
/// then plaintext. Falls back to an empty password (unauthenticated mode).
pub fn resolve_password(profile: &BridgeProfile, profile_name: &str) -> SecretString {
    resolve_password_with(profile, profile_name, keyring_password)
}

fn resolve_password_with(
    profile: &BridgeProfile,
    profile_name: &str,
    keyring: impl Fn(&str) -> Option<String>,
) -> SecretString {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return SecretString::from(val);
        }
    }

    // 2. System keyring
    if let Some(pw) = keyring(profile_name) {
        return SecretString::from(pw);
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return SecretString::from(pw.clone());
    }

    debug!(profile = profile_name, "no password configured, using unauthenticated mode");
    SecretString::from(String::new())
}

fn keyring_password(profile_name: &str) -> Option<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name)).ok()?;
    entry.get_password().ok()
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?;
    entry.set_password(password.expose_secret())?;
    Ok(())
}

// ── Translation to core config ──────────────────────────────────────

/// Build a `BridgeConfig` from a profile and the global defaults.
pub fn profile_to_bridge_config(
    profile: &BridgeProfile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<BridgeConfig, ConfigError> {
    let host = profile
        .host
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_owned);

    let id = profile
        .id
        .clone()
        .or_else(|| host.clone())
        .ok_or_else(|| ConfigError::Validation {
            field: format!("bridges.{profile_name}"),
            reason: "either `host` or `id` must be set".into(),
        })?;

    let refresh = profile.refresh.unwrap_or(defaults.refresh);
    if refresh == 0 {
        return Err(ConfigError::Validation {
            field: format!("bridges.{profile_name}.refresh"),
            reason: "must be at least 1 second".into(),
        });
    }

    let tls = match (&profile.ca_cert, profile.insecure) {
        (Some(ca_path), _) => TlsVerification::CustomCa(ca_path.clone()),
        (None, Some(false)) => TlsVerification::SystemDefaults,
        (None, _) => TlsVerification::DangerAcceptInvalid,
    };

    Ok(BridgeConfig {
        id,
        host,
        password: resolve_password(profile, profile_name),
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        refresh_interval: Duration::from_secs(refresh),
        ..BridgeConfig::default()
    })
}

/// Scan options from the `[discovery]` table.
pub fn scan_options(settings: &DiscoverySettings, defaults: &Defaults) -> ScanOptions {
    ScanOptions {
        idle_timeout: Duration::from_millis(settings.idle_timeout_ms),
        window: Duration::from_secs(settings.window_secs),
        probe_timeout: Duration::from_secs(defaults.timeout),
        ..ScanOptions::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
default_bridge = "garden"

[defaults]
output = "json"
timeout = 5

[bridges.garden]
host = "192.168.1.50"
password = "plain"
refresh = 30

[bridges.shed]
id = "5ccf7f123456"
insecure = false

[discovery]
idle_timeout_ms = 250
"#;

    fn load_sample() -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        load_config_from(&path).unwrap()
    }

    #[test]
    fn parses_profiles_and_defaults() {
        let config = load_sample();
        assert_eq!(config.defaults.output, "json");
        assert_eq!(config.defaults.timeout, 5);
        assert_eq!(config.defaults.refresh, 60);
        assert_eq!(config.discovery.idle_timeout_ms, 250);
        assert_eq!(config.discovery.window_secs, 15);
        assert_eq!(config.bridges.len(), 2);

        let (name, profile) = config.profile(None).unwrap().unwrap();
        assert_eq!(name, "garden");
        assert_eq!(profile.refresh, Some(30));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert!(config.bridges.is_empty());
        assert_eq!(config.defaults.timeout, 3);
        assert!(config.profile(None).unwrap().is_none());
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let config = load_sample();
        assert!(matches!(
            config.profile(Some("orchard")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn profile_translates_to_bridge_config() {
        let config = load_sample();
        let garden = &config.bridges["garden"];
        let bridge = profile_to_bridge_config(garden, "garden", &config.defaults).unwrap();
        assert_eq!(bridge.host.as_deref(), Some("192.168.1.50"));
        assert_eq!(bridge.id, "192.168.1.50");
        assert_eq!(bridge.refresh_interval, Duration::from_secs(30));
        assert_eq!(bridge.timeout, Duration::from_secs(5));
        assert_eq!(bridge.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(bridge.zone_cache_ttl, Duration::from_millis(3000));

        let shed = &config.bridges["shed"];
        let bridge = profile_to_bridge_config(shed, "shed", &config.defaults).unwrap();
        assert_eq!(bridge.host, None);
        assert_eq!(bridge.id, "5ccf7f123456");
        assert_eq!(bridge.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn profile_needs_host_or_id() {
        let err = profile_to_bridge_config(&BridgeProfile::default(), "empty", &Defaults::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn password_chain_order() {
        let profile = BridgeProfile {
            password: Some("plain".into()),
            password_env: Some("RAINLY_TEST_PASSWORD_UNSET_7F3A".into()),
            ..BridgeProfile::default()
        };

        let from_keyring = resolve_password_with(&profile, "garden", |user| {
            assert_eq!(user, "garden");
            Some("from-keyring".into())
        });
        assert_eq!(from_keyring.expose_secret(), "from-keyring");

        let plaintext = resolve_password_with(&profile, "garden", |_| None);
        assert_eq!(plaintext.expose_secret(), "plain");

        let empty = resolve_password_with(&BridgeProfile::default(), "garden", |_| None);
        assert!(empty.expose_secret().is_empty());
    }

    #[test]
    fn password_env_wins() {
        let profile = BridgeProfile {
            password: Some("plain".into()),
            password_env: Some("PATH".into()),
            ..BridgeProfile::default()
        };
        let resolved = resolve_password_with(&profile, "garden", |_| Some("kr".into()));
        assert_eq!(resolved.expose_secret(), std::env::var("PATH").unwrap());
    }

    #[test]
    fn save_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.bridges.insert(
            "garden".into(),
            BridgeProfile {
                host: Some("10.0.0.5".into()),
                ..BridgeProfile::default()
            },
        );
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.bridges["garden"].host.as_deref(), Some("10.0.0.5"));
    }

    #[test]
    fn scan_options_from_settings() {
        let options = scan_options(&DiscoverySettings::default(), &Defaults::default());
        assert_eq!(options.idle_timeout, Duration::from_millis(80));
        assert_eq!(options.window, Duration::from_secs(15));
        assert_eq!(options.probe_timeout, Duration::from_secs(3));
    }
}
