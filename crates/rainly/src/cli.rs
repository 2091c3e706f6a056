//! Clap derive structures for the `rainly` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// rainly -- discover and watch irrigation controllers on your network
#[derive(Debug, Parser)]
#[command(
    name = "rainly",
    version,
    about = "Discover and monitor irrigation controllers from the command line",
    long_about = "Finds irrigation controllers on the local segment with a UDP\n\
        broadcast, reads their versions, zones, provisioning and diagnostics\n\
        over the local HTTPS API, and watches zone state on a fixed schedule.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Bridge profile to use
    #[arg(long, short = 'b', env = "RAINLY_BRIDGE", global = true)]
    pub bridge: Option<String>,

    /// Bridge host (overrides profile)
    #[arg(long, short = 'H', env = "RAINLY_HOST", global = true)]
    pub host: Option<String>,

    /// Bridge password (overrides profile, keyring and env lookups)
    #[arg(long, env = "RAINLY_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "RAINLY_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Per-request timeout, e.g. "3s" or "500ms"
    #[arg(long, env = "RAINLY_TIMEOUT", global = true, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Delay between refresh cycles for `watch`, e.g. "60s" or "2m"
    #[arg(long, env = "RAINLY_REFRESH", global = true, value_parser = humantime::parse_duration)]
    pub refresh: Option<Duration>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Broadcast a discovery probe and list responding bridges
    #[command(alias = "scan")]
    Discover(DiscoverArgs),

    /// Show the bridge's API, hardware and software versions
    Version,

    /// List the bridge's zones
    #[command(alias = "z")]
    Zones,

    /// Show the bridge's provisioning data
    Info,

    /// Show the bridge's diagnostics
    Diag,

    /// Poll the bridge and print zone updates until interrupted
    Watch(WatchArgs),

    /// Manage CLI configuration and bridge profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Discover ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Upper bound on reply collection, e.g. "15s"
    #[arg(long, value_parser = humantime::parse_duration)]
    pub window: Option<Duration>,

    /// Stop after this long without a reply, e.g. "80ms"
    #[arg(long, value_parser = humantime::parse_duration)]
    pub idle: Option<Duration>,

    /// Include per-zone records in structured output
    #[arg(long)]
    pub zones: bool,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Only report this zone uid
    #[arg(long, short = 'z')]
    pub zone: Option<u32>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Show the effective configuration (passwords masked)
    Show,

    /// Store a bridge profile's password in the system keyring
    SetPassword {
        /// Profile name [default: --bridge, then default_bridge]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn humantime_flags_parse() {
        let cli = Cli::try_parse_from(["rainly", "--timeout", "500ms", "--refresh", "2m", "zones"])
            .map_err(|e| e.to_string());
        let cli = match cli {
            Ok(cli) => cli,
            Err(e) => panic!("parse failed: {e}"),
        };
        assert_eq!(cli.global.timeout, Some(Duration::from_millis(500)));
        assert_eq!(cli.global.refresh, Some(Duration::from_secs(120)));
        assert!(matches!(cli.command, Command::Zones));
    }
}
