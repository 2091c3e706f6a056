// Device API zone endpoints

use crate::client::DeviceClient;
use crate::error::Error;
use crate::models::{ZonesResponse, ZonesSnapshot};

impl DeviceClient {
    /// Current state of every zone, stamped with the fetch time.
    ///
    /// `GET zone`; an empty snapshot without a session.
    pub async fn get_zones(&self) -> Result<ZonesSnapshot, Error> {
        let resp: ZonesResponse = self.get_authenticated("zone").await?;
        Ok(ZonesSnapshot::new(resp.zones))
    }
}
