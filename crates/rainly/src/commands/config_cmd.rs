//! Config subcommand handlers.

use std::fmt::Write as _;

use secrecy::SecretString;

use rainly_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(
                &rainly_config::config_path().display().to_string(),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            output::print_output(&format_config_redacted(&cfg), global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword { profile } => {
            let cfg = config::load_config_or_default();
            let name = profile
                .or_else(|| global.bridge.clone())
                .or(cfg.default_bridge)
                .ok_or_else(|| CliError::Validation {
                    field: "profile".into(),
                    reason: "name a profile, pass --bridge, or set default_bridge".into(),
                })?;

            let password = match global.password {
                Some(ref pw) => pw.clone(),
                None => rpassword::prompt_password(format!("Password for '{name}': "))?,
            };
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "cannot be empty".into(),
                });
            }

            rainly_config::store_password(&name, &SecretString::from(password))?;
            output::status_line(&format!("password for '{name}' stored in keyring"), global.quiet);
            Ok(())
        }
    }
}

/// Render the config as TOML with secrets masked.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_bridge {
        let _ = writeln!(out, "default_bridge = \"{default}\"\n");
    }
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "refresh = {}", cfg.defaults.refresh);

    let _ = writeln!(out, "\n[discovery]");
    let _ = writeln!(out, "idle_timeout_ms = {}", cfg.discovery.idle_timeout_ms);
    let _ = writeln!(out, "window_secs = {}", cfg.discovery.window_secs);

    let mut names: Vec<_> = cfg.bridges.keys().collect();
    names.sort();
    for name in names {
        let b = &cfg.bridges[name];
        let _ = writeln!(out, "\n[bridges.{name}]");
        if let Some(ref host) = b.host {
            let _ = writeln!(out, "host = \"{host}\"");
        }
        if let Some(ref id) = b.id {
            let _ = writeln!(out, "id = \"{id}\"");
        }
        if b.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref env) = b.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if let Some(refresh) = b.refresh {
            let _ = writeln!(out, "refresh = {refresh}");
        }
        if let Some(timeout) = b.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(insecure) = b.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(ref ca) = b.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rainly_config::BridgeProfile;

    #[test]
    fn show_masks_passwords() {
        let mut cfg = Config {
            default_bridge: Some("garden".into()),
            ..Config::default()
        };
        cfg.bridges.insert(
            "garden".into(),
            BridgeProfile {
                host: Some("192.168.1.50".into()),
                password: Some("hunter2".into()),
                ..BridgeProfile::default()
            },
        );

        let text = format_config_redacted(&cfg);
        assert!(text.contains("default_bridge = \"garden\""));
        assert!(text.contains("[bridges.garden]"));
        assert!(text.contains("host = \"192.168.1.50\""));
        assert!(text.contains("password = \"****\""));
        assert!(!text.contains("hunter2"));
    }
}
