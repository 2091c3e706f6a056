// Device API system endpoints
//
// Version, provisioning and diagnostics. Only the version endpoint is
// reachable without a session.

use crate::client::DeviceClient;
use crate::error::Error;
use crate::models::{ApiVersion, DeviceInfo, Diagnostics};

impl DeviceClient {
    /// Firmware, hardware and API versions.
    ///
    /// `GET apiVer` (no session required)
    pub async fn get_version(&self) -> Result<ApiVersion, Error> {
        self.get("apiVer", None).await
    }

    /// Provisioning data (system settings, location, sensors).
    ///
    /// `GET provision`; empty without a session.
    pub async fn get_device_info(&self) -> Result<DeviceInfo, Error> {
        self.get_authenticated("provision").await
    }

    /// Diagnostics (uptime, memory, network).
    ///
    /// `GET diag`; empty without a session.
    pub async fn get_diagnostics(&self) -> Result<Diagnostics, Error> {
        self.get_authenticated("diag").await
    }
}
