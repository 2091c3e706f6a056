//! `rainly watch`: run the poll loop and stream zone updates until Ctrl-C.

use std::sync::Arc;

use chrono::Local;
use owo_colors::OwoColorize;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use rainly_api::DeviceClient;
use rainly_core::{BridgeController, BridgeStatus, ZoneInfo};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::commands::bridge::zone_state_label;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct ZoneEvent<'a> {
    bridge: &'a str,
    at: String,
    #[serde(flatten)]
    zone: &'a ZoneInfo,
}

pub async fn handle(
    controller: &BridgeController<DeviceClient>,
    args: &WatchArgs,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    let uids = subscribed_uids(controller, args, global).await?;

    let (tx, mut rx) = mpsc::unbounded_channel::<ZoneInfo>();
    for uid in &uids {
        controller.register_subscriber(*uid, Arc::new(tx.clone())).await;
    }
    drop(tx);

    controller.activate().await;
    output::status_line(
        &format!(
            "watching {} zone(s) on {} every {}",
            uids.len(),
            controller.api().address(),
            humantime::format_duration(controller.config().refresh_interval)
        ),
        global.quiet,
    );

    let mut status = controller.status();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            biased;
            _ = &mut ctrl_c => {
                debug!("interrupt received, stopping watch");
                break;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                print_status(current, controller.api().address(), global.quiet);
            }
            Some(zone) = rx.recv() => {
                let line = render_event(format, &controller.config().id, &zone)?;
                output::print_output(&line, global.quiet);
            }
        }
    }
    Ok(())
}

/// Zones to subscribe to: `--zone`, or every zone the first refresh returns.
async fn subscribed_uids(
    controller: &BridgeController<DeviceClient>,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<Vec<u32>, CliError> {
    if let Some(uid) = args.zone {
        return Ok(vec![uid]);
    }

    controller.refresh_now().await?;
    let uids: Vec<u32> = controller
        .zones_snapshot()
        .await
        .map(|snap| snap.zones.iter().map(|z| z.uid).collect())
        .unwrap_or_default();
    if uids.is_empty() {
        warn!("bridge returned no zones");
        output::status_line(
            "no zones reported; is a password configured for this bridge?",
            global.quiet,
        );
    }
    Ok(uids)
}

fn render_event(format: OutputFormat, bridge: &str, zone: &ZoneInfo) -> Result<String, CliError> {
    let now = Local::now();
    match format {
        OutputFormat::Table => Ok(format!(
            "{}  zone {:>2}  {:<20} {:<8} {}",
            now.format("%H:%M:%S"),
            zone.uid,
            zone.name,
            zone_state_label(zone.state),
            if zone.remaining > 0 {
                format!("{}s left", zone.remaining)
            } else {
                String::new()
            }
        )),
        OutputFormat::Plain => Ok(format!("{} {}", zone.uid, zone.state)),
        structured => {
            let event = ZoneEvent {
                bridge,
                at: now.to_rfc3339(),
                zone,
            };
            // Line-delimited JSON, or one YAML document per update.
            match structured {
                OutputFormat::Yaml => Ok(format!("---\n{}", serde_yaml::to_string(&event)?)),
                _ => Ok(serde_json::to_string(&event)?),
            }
        }
    }
}

fn print_status(status: BridgeStatus, address: &str, quiet: bool) {
    if quiet {
        return;
    }
    if output::should_color() {
        let label = match status {
            BridgeStatus::Online => status.green().to_string(),
            BridgeStatus::Offline => status.red().to_string(),
        };
        eprintln!("bridge {address} is {label}");
    } else {
        eprintln!("bridge {address} is {status}");
    }
}
