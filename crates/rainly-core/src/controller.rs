// ── Bridge controller ──
//
// Lifecycle of one managed bridge: an initial version check, then a
// fixed-delay refresh loop that reads diagnostics, device info and (when
// the cache is stale) zone state, and fans zone updates out to
// subscribers. Status and bridge properties are published on watch
// channels.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rainly_api::{DeviceClient, ZonesSnapshot};
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::address::AddressLookup;
use crate::api::BridgeApi;
use crate::cache::ZoneCache;
use crate::config::BridgeConfig;
use crate::error::CoreError;
use crate::registry::{Delivery, SubscriberRegistry, ZoneSubscriber};

// ── Observable state ─────────────────────────────────────────────

/// Reachability of the bridge as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BridgeStatus {
    Offline,
    Online,
}

/// Descriptive properties reported by the bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BridgeProperties {
    pub version_api: Option<String>,
    pub version_hardware: Option<String>,
    pub version_software: Option<String>,
    pub uptime: Option<String>,
}

/// What one refresh cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Zones present in the (cached or fresh) snapshot.
    pub zones: usize,
    /// Zones handed to a subscriber.
    pub delivered: usize,
    /// Whether the zone list was fetched rather than served from cache.
    pub zones_fetched: bool,
}

// ── BridgeController ─────────────────────────────────────────────

/// Poll coordinator for one bridge.
///
/// Cheaply cloneable via `Arc`. Call [`activate()`](Self::activate) to
/// start polling and [`dispose()`](Self::dispose) to stop it.
pub struct BridgeController<A: BridgeApi> {
    inner: Arc<ControllerInner<A>>,
}

impl<A: BridgeApi> Clone for BridgeController<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<A> {
    config: BridgeConfig,
    api: A,
    registry: SubscriberRegistry,
    /// Serializes refresh cycles; owns the zone cache and the failure streak.
    cycle: Mutex<CycleState>,
    status: watch::Sender<BridgeStatus>,
    last_rain: watch::Sender<Option<String>>,
    properties: watch::Sender<BridgeProperties>,
    /// Cancelled on dispose; every poll loop token is a child of it.
    cancel: CancellationToken,
    poll: Mutex<Option<PollTask>>,
    cycles: AtomicU64,
}

struct CycleState {
    cache: ZoneCache,
    consecutive_failures: u32,
}

struct PollTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl BridgeController<DeviceClient> {
    /// Build a controller backed by an HTTPS [`DeviceClient`].
    ///
    /// The host comes from the config, or else from the last address
    /// advertised for the bridge id.
    pub fn connect(config: BridgeConfig, lookup: &dyn AddressLookup) -> Result<Self, CoreError> {
        let host = match config.host.as_deref().filter(|h| !h.trim().is_empty()) {
            Some(host) => host.to_owned(),
            None => lookup
                .last_known_address(&config.id)
                .filter(|h| !h.is_empty())
                .ok_or_else(|| CoreError::Config {
                    message: format!(
                        "no host configured for bridge '{}' and no advertised address known",
                        config.id
                    ),
                })?,
        };
        debug!(id = %config.id, %host, "connecting to bridge");

        let client = DeviceClient::new(&host, config.password.clone(), &config.transport())?;
        Ok(Self::new(config, client))
    }
}

impl<A: BridgeApi> BridgeController<A> {
    /// Create a controller. Does not contact the bridge until
    /// [`activate()`](Self::activate).
    pub fn new(config: BridgeConfig, api: A) -> Self {
        let (status, _) = watch::channel(BridgeStatus::Offline);
        let (last_rain, _) = watch::channel(None);
        let (properties, _) = watch::channel(BridgeProperties::default());
        let cache = ZoneCache::new(config.zone_cache_ttl);

        Self {
            inner: Arc::new(ControllerInner {
                config,
                api,
                registry: SubscriberRegistry::new(),
                cycle: Mutex::new(CycleState {
                    cache,
                    consecutive_failures: 0,
                }),
                status,
                last_rain,
                properties,
                cancel: CancellationToken::new(),
                poll: Mutex::new(None),
                cycles: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// The device API this controller polls.
    pub fn api(&self) -> &A {
        &self.inner.api
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Check the bridge once, then start the refresh loop.
    ///
    /// A failed version check leaves the bridge offline but still starts
    /// polling, so the bridge comes online as soon as it answers.
    pub async fn activate(&self) {
        match self.inner.api.get_version().await {
            Ok(version) => {
                self.inner.properties.send_modify(|props| {
                    props.version_api = Some(version.api_ver);
                    props.version_hardware = Some(version.hw_ver);
                    props.version_software = Some(version.sw_ver);
                });
                self.set_status(BridgeStatus::Online);
            }
            Err(e) => {
                warn!(id = %self.inner.config.id, error = %e, "initial version check failed");
                self.set_status(BridgeStatus::Offline);
            }
        }

        self.ensure_polling().await;
    }

    /// Register `subscriber` for zone `uid` and start polling if no loop
    /// is running. A live loop picks the subscriber up on its next cycle.
    pub async fn register_subscriber(&self, uid: u32, subscriber: Arc<dyn ZoneSubscriber>) {
        if self.inner.registry.register(uid, subscriber) {
            debug!(uid, "replaced zone subscriber");
        } else {
            debug!(uid, "zone subscriber registered");
        }
        self.ensure_polling().await;
    }

    /// Stop polling and close the device client.
    ///
    /// A cycle already running is allowed to finish; none starts after
    /// this returns.
    pub async fn dispose(&self) {
        self.inner.cancel.cancel();
        if let Some(task) = self.inner.poll.lock().await.take() {
            task.cancel.cancel();
            join_poll_task(task).await;
        }
        self.inner.api.close();
        debug!(id = %self.inner.config.id, "bridge controller disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Spawn the poll loop unless a live one exists. A loop that ended
    /// (interrupted or cancelled) is reaped and replaced, so there is never
    /// more than one per controller.
    async fn ensure_polling(&self) {
        let mut poll = self.inner.poll.lock().await;
        if poll
            .as_ref()
            .is_some_and(|task| !task.cancel.is_cancelled() && !task.handle.is_finished())
        {
            trace!("poll loop already running");
            return;
        }
        if let Some(task) = poll.take() {
            task.cancel.cancel();
            join_poll_task(task).await;
        }

        if self.inner.cancel.is_cancelled() {
            debug!("controller disposed, not starting poll loop");
            return;
        }

        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(poll_task(self.clone(), cancel.clone()));
        *poll = Some(PollTask { cancel, handle });
        debug!(
            interval = ?self.inner.config.refresh_interval,
            "poll loop started"
        );
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Run one refresh cycle now.
    ///
    /// Serialized with the scheduled cycles, so back-to-back calls reuse
    /// fresh zone data instead of refetching it.
    pub async fn refresh_now(&self) -> Result<CycleReport, CoreError> {
        let mut state = self.inner.cycle.lock().await;
        self.inner.cycles.fetch_add(1, Ordering::Relaxed);
        let result = self.cycle_locked(&mut state).await;

        match &result {
            Ok(report) => {
                state.consecutive_failures = 0;
                trace!(?report, "refresh cycle complete");
                self.set_status(BridgeStatus::Online);
            }
            Err(e) => {
                state.consecutive_failures = state.consecutive_failures.saturating_add(1);
                warn!(
                    id = %self.inner.config.id,
                    error = %e,
                    failures = state.consecutive_failures,
                    "refresh cycle failed"
                );
                if state.consecutive_failures >= self.inner.config.offline_after_failures {
                    self.set_status(BridgeStatus::Offline);
                }
            }
        }
        result
    }

    async fn cycle_locked(&self, state: &mut CycleState) -> Result<CycleReport, CoreError> {
        let diagnostics = self.inner.api.get_diagnostics().await?;
        let uptime = diagnostics.uptime();
        self.inner
            .properties
            .send_if_modified(|props| replace_if_changed(&mut props.uptime, uptime));

        let info = self.inner.api.get_device_info().await?;
        self.inner.last_rain.send_replace(info.rain_sensor_rain_start());

        let zones_fetched = state.cache.is_stale();
        if zones_fetched {
            let snapshot = self.inner.api.get_zones().await?;
            debug!(zones = snapshot.zones.len(), "zone state fetched");
            state.cache.store(snapshot);
        }

        let mut report = CycleReport {
            zones: state.cache.zones().len(),
            delivered: 0,
            zones_fetched,
        };
        for zone in state.cache.zones() {
            match self.inner.registry.deliver(zone) {
                Delivery::Delivered => report.delivered += 1,
                Delivery::NoSubscriber => trace!(uid = zone.uid, "no subscriber for zone"),
            }
        }
        Ok(report)
    }

    fn set_status(&self, status: BridgeStatus) {
        let changed = self.inner.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            info!(id = %self.inner.config.id, %status, "bridge status changed");
        }
    }

    // ── Observables ──────────────────────────────────────────────

    pub fn status(&self) -> watch::Receiver<BridgeStatus> {
        self.inner.status.subscribe()
    }

    pub fn current_status(&self) -> BridgeStatus {
        *self.inner.status.borrow()
    }

    /// Rain-sensor start marker from the last device info read.
    pub fn last_rain(&self) -> watch::Receiver<Option<String>> {
        self.inner.last_rain.subscribe()
    }

    pub fn properties(&self) -> watch::Receiver<BridgeProperties> {
        self.inner.properties.subscribe()
    }

    /// The cached zone snapshot, if any.
    pub async fn zones_snapshot(&self) -> Option<ZonesSnapshot> {
        self.inner.cycle.lock().await.cache.snapshot().cloned()
    }

    /// Number of refresh cycles started so far.
    pub fn cycle_count(&self) -> u64 {
        self.inner.cycles.load(Ordering::Relaxed)
    }
}

fn replace_if_changed(slot: &mut Option<String>, value: Option<String>) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

/// Fixed-delay refresh loop: run a cycle, then sleep the full interval.
async fn poll_task<A: BridgeApi>(controller: BridgeController<A>, cancel: CancellationToken) {
    let period = controller.inner.config.refresh_interval;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        // Failures are logged and counted inside; only an interrupted
        // client ends the loop.
        if let Err(CoreError::Interrupted { address }) = controller.refresh_now().await {
            debug!(%address, "refresh interrupted, stopping poll loop");
            break;
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(period) => {}
        }
    }
    trace!("poll loop stopped");
}

async fn join_poll_task(task: PollTask) {
    if let Err(e) = task.handle.await {
        if e.is_panic() {
            warn!(error = %e, "poll loop panicked");
        }
    }
}
