//! `rainly discover`: broadcast scan with a spinner, then a bridge table.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;

use rainly_config::Config;
use rainly_core::{DiscoveredBridge, DiscoveredThing, DiscoveryListener};

use crate::cli::{DiscoverArgs, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct BridgeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Zones")]
    zones: u32,
}

impl From<&DiscoveredBridge> for BridgeRow {
    fn from(b: &DiscoveredBridge) -> Self {
        let model = b.model.to_string();
        Self {
            id: b.bridge_id.clone(),
            name: b.name.clone(),
            model: if model.is_empty() { "unknown".into() } else { model },
            host: b.host.clone(),
            zones: b.zone_count,
        }
    }
}

pub async fn handle(
    args: &DiscoverArgs,
    global: &GlobalOpts,
    cfg: &Config,
    format: OutputFormat,
) -> Result<(), CliError> {
    let options = config::resolve_scan(global, args, cfg);
    let listener = DiscoveryListener::new(&options);

    let spinner = spinner(global.quiet);
    let things = listener.scan().await;
    spinner.finish_and_clear();
    let things = things?;

    let bridges: Vec<DiscoveredBridge> = things
        .iter()
        .filter_map(|thing| match thing {
            DiscoveredThing::Bridge(b) => Some(b.clone()),
            DiscoveredThing::Zone(_) => None,
        })
        .collect();
    if bridges.is_empty() {
        output::status_line("no bridges answered", global.quiet);
        return Ok(());
    }

    let out = if args.zones && !matches!(format, OutputFormat::Table | OutputFormat::Plain) {
        output::render_structured(format, &things)?
    } else {
        output::render_list(
            format,
            &bridges,
            |b| BridgeRow::from(b),
            |b| b.host.clone(),
        )?
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed}") {
        pb.set_style(style);
    }
    pb.set_message("scanning for bridges");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
