// UDP broadcast discovery
//
// Controllers listen on UDP 15800 for a fixed probe string and answer to
// port 15900 with `TAG||MAC||NAME||ADDRESS`. A scan sends one probe and
// collects replies until the scan window closes or the network goes quiet
// for longer than the idle timeout.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::{self, Instant};
use tracing::{debug, trace};

use crate::error::Error;

/// Payload of the broadcast probe.
pub const PROBE_MESSAGE: &str = "OpenSmartHouse Discovery";
/// Port controllers listen on for probes.
pub const PROBE_PORT: u16 = 15800;
/// Port replies are sent to.
pub const REPLY_PORT: u16 = 15900;
/// Identity tag carried by irrigation controllers.
pub const FINGERPRINT: &str = "SPRINKLER";

const FIELD_DELIMITER: &str = "||";
const RECEIVE_BUFFER: usize = 15_000;

/// One parsed discovery datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryReply {
    pub tag: String,
    pub mac: String,
    pub name: String,
    pub address: String,
}

impl DiscoveryReply {
    /// Parse `TAG||MAC||NAME||ADDRESS`. Extra fields are ignored.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let fields: Vec<&str> = text.split(FIELD_DELIMITER).collect();
        let [tag, mac, name, address, ..] = fields.as_slice() else {
            return Err(Error::MalformedReply {
                reason: format!("expected 4 fields, got {}", fields.len()),
            });
        };
        Ok(Self {
            tag: (*tag).to_owned(),
            mac: (*mac).to_owned(),
            name: (*name).to_owned(),
            address: (*address).to_owned(),
        })
    }

    /// Whether the reply came from an irrigation controller.
    pub fn is_valid(&self) -> bool {
        self.tag == FINGERPRINT
    }
}

/// Socket and timing parameters for one scan.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Local address replies arrive on.
    pub bind: SocketAddr,
    /// Where the probe is sent.
    pub target: SocketAddr,
    /// End the scan when no datagram arrives for this long.
    pub idle_timeout: Duration,
    /// Upper bound on the whole scan.
    pub window: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, REPLY_PORT).into(),
            target: SocketAddrV4::new(Ipv4Addr::BROADCAST, PROBE_PORT).into(),
            idle_timeout: Duration::from_millis(80),
            window: Duration::from_secs(15),
        }
    }
}

/// Sends the discovery probe and gathers valid replies.
#[derive(Debug, Clone, Default)]
pub struct BroadcastProbe {
    config: ProbeConfig,
}

impl BroadcastProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Run one scan.
    ///
    /// Fails only if the socket cannot be set up or the probe cannot be
    /// sent. Malformed and foreign replies are dropped; a receive error
    /// ends the scan with whatever was collected so far.
    pub async fn run(&self) -> Result<Vec<DiscoveryReply>, Error> {
        let socket = UdpSocket::bind(self.config.bind)
            .await
            .map_err(|source| Error::Discovery {
                action: "bind",
                source,
            })?;
        socket
            .set_broadcast(true)
            .map_err(|source| Error::Discovery {
                action: "enable broadcast",
                source,
            })?;
        socket
            .send_to(PROBE_MESSAGE.as_bytes(), self.config.target)
            .await
            .map_err(|source| Error::Discovery {
                action: "send probe",
                source,
            })?;
        debug!(target = %self.config.target, "discovery probe sent");

        let deadline = Instant::now() + self.config.window;
        let mut buffer = vec![0u8; RECEIVE_BUFFER];
        let mut replies = Vec::new();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!("discovery window elapsed");
                break;
            }

            let wait = remaining.min(self.config.idle_timeout);
            match time::timeout(wait, socket.recv_from(&mut buffer)).await {
                Err(_) => {
                    trace!("no discovery reply within {:?}, ending scan", wait);
                    break;
                }
                Ok(Err(e)) => {
                    debug!(error = %e, "discovery receive failed, ending scan");
                    break;
                }
                Ok(Ok((size, from))) => {
                    let raw = String::from_utf8_lossy(&buffer[..size]);
                    let text = raw.trim_matches(|c: char| c.is_whitespace() || c == '\0');
                    match DiscoveryReply::parse(text) {
                        Ok(reply) if reply.is_valid() => {
                            debug!(%from, mac = %reply.mac, name = %reply.name, "controller replied");
                            replies.push(reply);
                        }
                        Ok(reply) => {
                            debug!(%from, tag = %reply.tag, "ignoring reply from foreign device");
                        }
                        Err(e) => debug!(%from, error = %e, "ignoring discovery datagram"),
                    }
                }
            }
        }

        Ok(replies)
    }
}
