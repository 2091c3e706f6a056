//! Flag overrides on top of `rainly-config` profiles.
//!
//! Precedence is flag > env var > profile > `[defaults]`. Core receives
//! a finished `BridgeConfig` / `ScanOptions` and never sees these types.

use clap::ValueEnum;
use secrecy::SecretString;

use rainly_config::{BridgeProfile, Config, ConfigError};
use rainly_core::{BridgeConfig, ScanOptions};

use crate::cli::{DiscoverArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Load the config file, falling back to defaults when it is unreadable.
pub fn load_config_or_default() -> Config {
    rainly_config::load_config().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config not loaded, using defaults");
        Config::default()
    })
}

/// Effective output format: `--output`, then `[defaults] output`, then table.
pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        OutputFormat::from_str(&cfg.defaults.output, true).unwrap_or(OutputFormat::Table)
    })
}

/// Build the `BridgeConfig` for bridge-bound commands.
pub fn resolve_bridge(global: &GlobalOpts, cfg: &Config) -> Result<BridgeConfig, CliError> {
    let selected = cfg.profile(global.bridge.as_deref()).map_err(|e| match e {
        ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound {
            name: profile,
            available: available_profiles(cfg),
        },
        other => other.into(),
    })?;

    let mut config = match selected {
        Some((name, profile)) => {
            let mut profile = profile.clone();
            if let Some(ref host) = global.host {
                profile.host = Some(host.clone());
            }
            rainly_config::profile_to_bridge_config(&profile, &name, &cfg.defaults)?
        }
        None => {
            let host = global.host.clone().ok_or_else(|| CliError::NoBridge {
                path: rainly_config::config_path().display().to_string(),
            })?;
            rainly_config::profile_to_bridge_config(
                &BridgeProfile {
                    host: Some(host),
                    ..BridgeProfile::default()
                },
                "command-line",
                &cfg.defaults,
            )?
        }
    };

    if let Some(ref password) = global.password {
        config.password = SecretString::from(password.clone());
    }
    if let Some(timeout) = global.timeout {
        config.timeout = timeout;
    }
    if let Some(refresh) = global.refresh {
        if refresh.is_zero() {
            return Err(CliError::Validation {
                field: "refresh".into(),
                reason: "must be greater than zero".into(),
            });
        }
        config.refresh_interval = refresh;
    }
    Ok(config)
}

/// Build `ScanOptions` from `[discovery]` plus `discover` flags.
pub fn resolve_scan(global: &GlobalOpts, args: &DiscoverArgs, cfg: &Config) -> ScanOptions {
    let mut options = rainly_config::scan_options(&cfg.discovery, &cfg.defaults);
    if let Some(window) = args.window {
        options.window = window;
    }
    if let Some(idle) = args.idle {
        options.idle_timeout = idle;
    }
    if let Some(timeout) = global.timeout {
        options.probe_timeout = timeout;
    }
    options
}

fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.bridges.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}
