//! Command dispatch: CLI args -> core calls -> output formatting.

pub mod bridge;
pub mod config_cmd;
pub mod discover;
pub mod watch;

use rainly_config::Config;
use rainly_core::{AddressCache, BridgeController};

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// Dispatch a bridge-bound command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let format = config::output_format(global, cfg);
    if let Command::Discover(args) = cmd {
        return discover::handle(&args, global, cfg, format).await;
    }

    let bridge = config::resolve_bridge(global, cfg)?;
    // One-shot invocations have no advertisement source.
    let controller = BridgeController::connect(bridge, &AddressCache::new())?;

    let result = match cmd {
        Command::Version => bridge::version(&controller, global, format).await,
        Command::Zones => bridge::zones(&controller, global, format).await,
        Command::Info => bridge::info(&controller, global, format).await,
        Command::Diag => bridge::diag(&controller, global, format).await,
        Command::Watch(args) => watch::handle(&controller, &args, global, format).await,
        // Handled before dispatch
        Command::Discover(_) | Command::Config(_) | Command::Completions(_) => Ok(()),
    };
    controller.dispose().await;
    result
}
