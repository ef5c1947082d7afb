// ── Session abstraction ──
//
// Single source of truth for "are we talking to the peripheral".
// Owns the endpoint, the connection state, and every observable piece
// of peripheral state; gates all other operations on an explicit,
// user-invoked reachability check. Registry operations, mode control,
// and the notification synchronizer are implemented as inherent
// methods in their own modules.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use attendly_api::{
    DeviceClient, DeviceStatus, FingerprintSlot, ScanEvent, TransportConfig, TunnelAgentClient,
    TunnelDescriptor,
};

use crate::classify::{Transport, classify};
use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::notify::Poller;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
///
/// Transitions only through [`Session::test_connection`] -- never
/// inferred from the success or failure of unrelated requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

// ── Session ──────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<SessionInner>`. Each state field has
/// exactly one writing component: the endpoint is written by explicit
/// configuration and (once, when unset) by tunnel discovery; the
/// connection state only by the connection test; the current event and
/// recent log only by the notification poll task; scanning mode only
/// by the mode toggle.
#[derive(Clone)]
pub struct Session {
    pub(crate) inner: Arc<SessionInner>,
}

pub(crate) struct SessionInner {
    pub(crate) config: SessionConfig,
    pub(crate) endpoint: watch::Sender<Option<Url>>,
    pub(crate) connection_state: watch::Sender<ConnectionState>,
    pub(crate) scanning_mode: watch::Sender<bool>,
    pub(crate) registry: watch::Sender<Vec<FingerprintSlot>>,
    pub(crate) current_event: watch::Sender<Option<ScanEvent>>,
    pub(crate) recent_events: watch::Sender<Vec<ScanEvent>>,
    pub(crate) tunnel: watch::Sender<Option<TunnelDescriptor>>,
    pub(crate) device: Mutex<Option<Arc<DeviceClient>>>,
    pub(crate) poller: Mutex<Option<Poller>>,
    pub(crate) task_handles: Mutex<Vec<JoinHandle<()>>>,
    pub(crate) cancel: CancellationToken,
}

impl Session {
    /// Create a new session from configuration. Does NOT probe anything --
    /// call [`start()`](Self::start) to begin tunnel discovery and
    /// [`test_connection()`](Self::test_connection) to reach the peripheral.
    pub fn new(config: SessionConfig) -> Self {
        let (endpoint, _) = watch::channel(config.endpoint.clone());
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (scanning_mode, _) = watch::channel(false);
        let (registry, _) = watch::channel(Vec::new());
        let (current_event, _) = watch::channel(None);
        let (recent_events, _) = watch::channel(Vec::new());
        let (tunnel, _) = watch::channel(None);

        Self {
            inner: Arc::new(SessionInner {
                config,
                endpoint,
                connection_state,
                scanning_mode,
                registry,
                current_event,
                recent_events,
                tunnel,
                device: Mutex::new(None),
                poller: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Access the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Start background tunnel discovery. Call once per session.
    ///
    /// The probe runs for the session's whole lifetime regardless of
    /// connection state; a missing local tunnel agent is the expected
    /// common case and produces no user-visible noise.
    pub async fn start(&self) {
        let session = self.clone();
        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(tunnel_discovery_task(session, cancel));
        self.inner.task_handles.lock().await.push(handle);
    }

    // ── Endpoint configuration ───────────────────────────────────

    /// Configure the peripheral address (scheme + host[:port]).
    ///
    /// Overrides anything tunnel discovery may have populated. Does not
    /// change the connection state -- run a connection test afterwards.
    pub async fn set_endpoint(&self, address: &str) -> Result<(), CoreError> {
        let trimmed = address.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Config {
                message: "endpoint must not be empty".into(),
            });
        }
        let url = Url::parse(trimmed).map_err(|e| CoreError::Config {
            message: format!("invalid endpoint {trimmed:?}: {e}"),
        })?;

        let _ = self.inner.endpoint.send_replace(Some(url));
        // The cached client belongs to the previous address.
        *self.inner.device.lock().await = None;
        Ok(())
    }

    /// The currently configured endpoint, if any.
    pub fn endpoint(&self) -> Option<Url> {
        self.inner.endpoint.borrow().clone()
    }

    /// Subscribe to endpoint changes (configuration or tunnel discovery).
    pub fn endpoint_updates(&self) -> watch::Receiver<Option<Url>> {
        self.inner.endpoint.subscribe()
    }

    /// Advisory classification of the current endpoint.
    pub fn transport(&self) -> Transport {
        self.inner
            .endpoint
            .borrow()
            .as_ref()
            .map_or(Transport::Local, |url| classify(url.as_str()))
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Explicit reachability check against `{endpoint}/status`.
    ///
    /// Any 2xx flips the state to `Connected` and triggers an immediate
    /// full registry reload; any failure flips to `Disconnected` and is
    /// surfaced to the caller. Never retried automatically.
    pub async fn test_connection(&self) -> Result<DeviceStatus, CoreError> {
        let device = self.device_for_current_endpoint().await?;

        match device.status().await {
            Ok(status) => {
                let _ = self
                    .inner
                    .connection_state
                    .send_replace(ConnectionState::Connected);
                info!(
                    endpoint = %device.base_url(),
                    transport = ?self.transport(),
                    "connected to peripheral"
                );

                if let Err(e) = self.refresh_registry().await {
                    warn!(error = %e, "initial registry load failed");
                }
                self.sync_poller_state().await;
                Ok(status)
            }
            Err(e) => {
                let _ = self
                    .inner
                    .connection_state
                    .send_replace(ConnectionState::Disconnected);
                self.sync_poller_state().await;
                debug!(error = %e, "connection test failed");
                Err(e.into())
            }
        }
    }

    /// Cancel all background tasks and reset the connection state.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        if let Some(poller) = self.inner.poller.lock().await.take() {
            poller.stop().await;
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        let _ = self
            .inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("session shut down");
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Subscribe to scanning-mode changes.
    pub fn scanning_mode(&self) -> watch::Receiver<bool> {
        self.inner.scanning_mode.subscribe()
    }

    /// Subscribe to the fingerprint registry (full snapshots).
    pub fn registry(&self) -> watch::Receiver<Vec<FingerprintSlot>> {
        self.inner.registry.subscribe()
    }

    /// Subscribe to the currently displayed live event.
    pub fn current_event(&self) -> watch::Receiver<Option<ScanEvent>> {
        self.inner.current_event.subscribe()
    }

    /// Subscribe to the peripheral's recent-event log.
    pub fn recent_events(&self) -> watch::Receiver<Vec<ScanEvent>> {
        self.inner.recent_events.subscribe()
    }

    /// Subscribe to the discovered tunnel descriptor.
    pub fn tunnel(&self) -> watch::Receiver<Option<TunnelDescriptor>> {
        self.inner.tunnel.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        *self.inner.connection_state.borrow() == ConnectionState::Connected
    }

    pub(crate) fn is_scanning(&self) -> bool {
        *self.inner.scanning_mode.borrow()
    }

    // ── Client plumbing ──────────────────────────────────────────

    /// Client for the current endpoint, gated on `Connected`.
    ///
    /// Every operation other than the explicit connection test goes
    /// through here, so nothing is ever sent while disconnected.
    pub(crate) async fn device(&self) -> Result<Arc<DeviceClient>, CoreError> {
        if !self.is_connected() {
            return Err(CoreError::Disconnected);
        }
        self.device_for_current_endpoint().await
    }

    /// Client for the current endpoint regardless of connection state
    /// (the connection test itself needs one while disconnected).
    pub(crate) async fn device_for_current_endpoint(
        &self,
    ) -> Result<Arc<DeviceClient>, CoreError> {
        let url = self.current_endpoint()?;

        let mut slot = self.inner.device.lock().await;
        if let Some(client) = slot.as_ref() {
            if client.base_url() == &url {
                return Ok(Arc::clone(client));
            }
        }

        let transport = TransportConfig {
            timeout: self.inner.config.request_timeout,
        };
        let client = Arc::new(DeviceClient::new(url, &transport)?);
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    fn current_endpoint(&self) -> Result<Url, CoreError> {
        self.inner
            .endpoint
            .borrow()
            .clone()
            .ok_or(CoreError::Config {
                message: "no endpoint configured".into(),
            })
    }

    /// Record a tunnel reported by the local agent, populating an
    /// unset endpoint exactly once. A user-supplied endpoint is never
    /// overridden.
    fn apply_discovered_tunnel(&self, tunnel: TunnelDescriptor) {
        if self.inner.endpoint.borrow().is_none() {
            match Url::parse(&tunnel.public_url) {
                Ok(url) => {
                    info!(url = %url, "populating endpoint from discovered tunnel");
                    let _ = self.inner.endpoint.send_replace(Some(url));
                }
                Err(e) => {
                    warn!(error = %e, url = %tunnel.public_url, "discovered tunnel URL is invalid");
                }
            }
        }
        // The agent reports the same tunnel on every probe; only wake
        // subscribers when it actually changes.
        self.inner.tunnel.send_if_modified(|slot| {
            if slot.as_ref() == Some(&tunnel) {
                return false;
            }
            *slot = Some(tunnel);
            true
        });
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically probe the local tunnel agent.
///
/// Every failure is swallowed: no agent running is the normal state of
/// the world, not an error the user should see.
async fn tunnel_discovery_task(session: Session, cancel: CancellationToken) {
    let transport = TransportConfig {
        timeout: session.inner.config.request_timeout,
    };
    let agent = match TunnelAgentClient::new(
        session.inner.config.tunnel_agent_url.clone(),
        &transport,
    ) {
        Ok(agent) => agent,
        Err(e) => {
            warn!(error = %e, "could not build tunnel agent client");
            return;
        }
    };

    let mut interval = tokio::time::interval(session.inner.config.tunnel_probe_interval);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match agent.active_tunnel().await {
                    Ok(Some(tunnel)) => {
                        if cancel.is_cancelled() {
                            break;
                        }
                        session.apply_discovered_tunnel(tunnel);
                    }
                    Ok(None) => {}
                    Err(e) => debug!(error = %e, "tunnel agent not reachable"),
                }
            }
        }
    }
}
