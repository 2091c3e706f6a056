//! One-shot bridge reads: version, zones, provisioning, diagnostics.

use tabled::Tabled;

use rainly_api::DeviceClient;
use rainly_core::{BridgeController, HardwareModel, ZoneInfo};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "UID")]
    uid: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: &'static str,
    #[tabled(rename = "Active")]
    active: &'static str,
    #[tabled(rename = "Remaining")]
    remaining: String,
}

impl From<&ZoneInfo> for ZoneRow {
    fn from(z: &ZoneInfo) -> Self {
        Self {
            uid: z.uid,
            name: z.name.clone(),
            state: zone_state_label(z.state),
            active: if z.active { "yes" } else { "no" },
            remaining: if z.remaining > 0 {
                format!("{}s", z.remaining)
            } else {
                String::new()
            },
        }
    }
}

pub(crate) fn zone_state_label(state: i32) -> &'static str {
    match state {
        0 => "idle",
        1 => "running",
        2 => "queued",
        _ => "unknown",
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn version(
    controller: &BridgeController<DeviceClient>,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    let version = controller.api().get_version().await?;
    let model = HardwareModel::from_code(version.hardware_code());
    let out = output::render_single(
        format,
        &version,
        |v| {
            format!(
                "API:      {}\nHardware: {}{}\nSoftware: {}",
                v.api_ver,
                v.hw_ver,
                match model {
                    HardwareModel::Unknown => String::new(),
                    known => format!(" ({known})"),
                },
                v.sw_ver
            )
        },
        |v| v.api_ver.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn zones(
    controller: &BridgeController<DeviceClient>,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    let snapshot = controller.api().get_zones().await?;
    if snapshot.is_empty() {
        warn_if_unauthenticated(controller, global).await;
    }
    let out = output::render_list(
        format,
        &snapshot.zones,
        |z| ZoneRow::from(z),
        |z| z.uid.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn info(
    controller: &BridgeController<DeviceClient>,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    let info = controller.api().get_device_info().await?;
    if info.is_empty() {
        warn_if_unauthenticated(controller, global).await;
    }
    let out = output::render_single(
        format,
        &info,
        |i| output::render_fields(&i.fields),
        |i| i.rain_sensor_rain_start().unwrap_or_default(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn diag(
    controller: &BridgeController<DeviceClient>,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    let diag = controller.api().get_diagnostics().await?;
    if diag.is_empty() {
        warn_if_unauthenticated(controller, global).await;
    }
    let out = output::render_single(
        format,
        &diag,
        |d| output::render_fields(&d.fields),
        |d| d.uptime().unwrap_or_default(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Token-guarded reads come back empty without a session; say why.
async fn warn_if_unauthenticated(controller: &BridgeController<DeviceClient>, global: &GlobalOpts) {
    if !controller.api().is_authenticated().await {
        output::status_line(
            "not logged in: set a password with --password or `rainly config set-password`",
            global.quiet,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_row_formats_state() {
        let zone = ZoneInfo {
            uid: 3,
            name: "Roses".into(),
            state: 1,
            active: true,
            remaining: 120,
            ..ZoneInfo::default()
        };
        let row = ZoneRow::from(&zone);
        assert_eq!(row.state, "running");
        assert_eq!(row.active, "yes");
        assert_eq!(row.remaining, "120s");

        let idle = ZoneRow::from(&ZoneInfo::default());
        assert_eq!(idle.state, "idle");
        assert!(idle.remaining.is_empty());
    }
}
