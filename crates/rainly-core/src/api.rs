// ── Bridge API seam ──
//
// The controller and the discovery listener talk to devices through
// these traits. `DeviceClient` is the production implementation; tests
// substitute scripted fakes.

use std::future::Future;

use rainly_api::{ApiVersion, DeviceClient, DeviceInfo, Diagnostics, TransportConfig, ZonesSnapshot};
use secrecy::SecretString;

/// Operations the poll coordinator needs from a device.
pub trait BridgeApi: Send + Sync + 'static {
    fn get_version(&self) -> impl Future<Output = Result<ApiVersion, rainly_api::Error>> + Send;

    fn get_zones(&self) -> impl Future<Output = Result<ZonesSnapshot, rainly_api::Error>> + Send;

    fn get_device_info(&self) -> impl Future<Output = Result<DeviceInfo, rainly_api::Error>> + Send;

    fn get_diagnostics(
        &self,
    ) -> impl Future<Output = Result<Diagnostics, rainly_api::Error>> + Send;

    /// Abort in-flight requests; called once on dispose.
    fn close(&self);
}

impl BridgeApi for DeviceClient {
    async fn get_version(&self) -> Result<ApiVersion, rainly_api::Error> {
        DeviceClient::get_version(self).await
    }

    async fn get_zones(&self) -> Result<ZonesSnapshot, rainly_api::Error> {
        DeviceClient::get_zones(self).await
    }

    async fn get_device_info(&self) -> Result<DeviceInfo, rainly_api::Error> {
        DeviceClient::get_device_info(self).await
    }

    async fn get_diagnostics(&self) -> Result<Diagnostics, rainly_api::Error> {
        DeviceClient::get_diagnostics(self).await
    }

    fn close(&self) {
        DeviceClient::close(self);
    }
}

/// Classifies a discovery responder by asking for its version.
pub trait VersionProbe: Send + Sync {
    fn probe_version(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<ApiVersion, rainly_api::Error>> + Send;
}

/// Probes over HTTPS with a throwaway unauthenticated client.
#[derive(Debug, Clone, Default)]
pub struct HttpVersionProbe {
    transport: TransportConfig,
}

impl HttpVersionProbe {
    pub fn new(transport: TransportConfig) -> Self {
        Self { transport }
    }
}

impl VersionProbe for HttpVersionProbe {
    async fn probe_version(&self, address: &str) -> Result<ApiVersion, rainly_api::Error> {
        let client = DeviceClient::new(address, SecretString::from(String::new()), &self.transport)?;
        client.get_version().await
    }
}
