//! Connection session: one per connected charging station
//!
//! Owns the station's identity and routing context for the lifetime of its
//! socket and hands every inbound command to the [`CommandDispatcher`].
//! Commands are processed one at a time in arrival order: the command slot
//! is held until the handler's response has been traced.

use std::sync::{Arc, OnceLock, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info};

use super::client::ChargingStationClient;
use super::identity::{HostAffinity, SessionIdentity};
use super::metrics::SessionMetrics;
use super::state::{AtomicSessionState, SessionError, SessionState};
use crate::application::charging::dispatch::{CommandDispatcher, RequestError, SessionContext};
use crate::application::charging::services::ChargingStationService;
use crate::domain::charging_station::StationLocation;
use crate::domain::ocpp::{ConnectionContext, TransportKind};
use crate::domain::{DomainResult, RuntimeData};

/// Collaborators shared by every session of a gateway instance.
#[derive(Clone)]
pub struct SessionServices {
    pub dispatcher: Arc<CommandDispatcher>,
    pub stations: Arc<ChargingStationService>,
    pub host: HostAffinity,
    pub monitoring: bool,
}

pub struct ConnectionSession {
    identity: SessionIdentity,
    services: SessionServices,
    outbound: mpsc::UnboundedSender<String>,
    state: AtomicSessionState,
    command_slot: Mutex<()>,
    /// Cached once the station record has a site area
    location: RwLock<Option<StationLocation>>,
    metrics: OnceLock<SessionMetrics>,
    client: OnceLock<ChargingStationClient>,
    /// Flips to `true` once the session is closed
    closed: watch::Sender<bool>,
}

impl ConnectionSession {
    pub fn new(
        identity: SessionIdentity,
        services: SessionServices,
        outbound: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            identity,
            services,
            outbound,
            state: AtomicSessionState::new(),
            command_slot: Mutex::new(()),
            location: RwLock::new(None),
            metrics: OnceLock::new(),
            client: OnceLock::new(),
            closed: watch::channel(false).0,
        }
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Available once initialized.
    pub fn client(&self) -> Option<&ChargingStationClient> {
        self.client.get()
    }

    pub fn metrics(&self) -> Option<&SessionMetrics> {
        self.metrics.get()
    }

    /// One-time setup. Calling it twice is an error.
    pub fn initialize(&self) -> Result<(), SessionError> {
        self.state
            .transition(SessionState::Created, SessionState::Initializing)?;

        if self.services.monitoring {
            let metrics = SessionMetrics::for_tenant(&self.identity.tenant.subdomain);
            metrics.opened.increment(1);
            let _ = self.metrics.set(metrics);
        }
        let _ = self.client.set(ChargingStationClient::new(
            self.identity.charging_station_id.clone(),
            self.outbound.clone(),
        ));

        self.state
            .transition(SessionState::Initializing, SessionState::Active)?;

        info!(
            tenant_id = self.identity.tenant.id.as_str(),
            charging_station_id = self.identity.charging_station_id.as_str(),
            protocol = self.identity.negotiated_protocol.as_str(),
            transport = %self.identity.transport,
            "🔌 Session initialized"
        );
        Ok(())
    }

    /// Single entry point for every inbound command.
    pub async fn handle_request(&self, command: &str, payload: Value) -> Result<Value, RequestError> {
        let _slot = self.command_slot.lock().await;

        let state = self.state.get();
        if !state.accepts_commands() {
            debug!(
                tenant_id = self.identity.tenant.id.as_str(),
                charging_station_id = self.identity.charging_station_id.as_str(),
                action = command,
                %state,
                "Command refused, session not active"
            );
            return Err(RequestError::SessionState(state));
        }

        self.services
            .dispatcher
            .dispatch(self, command, payload)
            .await
    }

    pub fn on_ping(&self, message: &[u8]) {
        debug!(
            tenant_id = self.identity.tenant.id.as_str(),
            charging_station_id = self.identity.charging_station_id.as_str(),
            bytes = message.len(),
            "Ping received"
        );
    }

    pub fn on_pong(&self, message: &[u8]) {
        debug!(
            tenant_id = self.identity.tenant.id.as_str(),
            charging_station_id = self.identity.charging_station_id.as_str(),
            bytes = message.len(),
            "Pong received"
        );
    }

    /// Refresh last-seen, token and host affinity on the station record.
    /// Returns `false` when the station has no record yet.
    pub async fn update_runtime_data(&self) -> DomainResult<bool> {
        let data = RuntimeData {
            last_seen: Utc::now(),
            token_id: self.identity.token_id.clone(),
            cloud_host_ip: self.services.host.ip.clone(),
            cloud_host_name: self.services.host.name.clone(),
        };
        self.services
            .stations
            .update_runtime_data(
                &self.identity.tenant.id,
                &self.identity.charging_station_id,
                &data,
            )
            .await
    }

    /// Stop accepting commands, let the one in flight finish, then close.
    pub async fn close(&self) -> Result<(), SessionError> {
        let previous = self.state.begin_closing()?;

        // Wait for the in-flight command, if any
        drop(self.command_slot.lock().await);
        self.state.set(SessionState::Closed);
        self.closed.send_replace(true);

        if let Some(metrics) = self.metrics.get() {
            metrics.closed.increment(1);
        }
        info!(
            tenant_id = self.identity.tenant.id.as_str(),
            charging_station_id = self.identity.charging_station_id.as_str(),
            %previous,
            "🔌 Session closed"
        );
        Ok(())
    }

    /// Resolves once the session is closed, from any side.
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        // The sender lives as long as `self`
        let _ = rx.wait_for(|closed| *closed).await;
    }

    fn read_location(&self) -> Option<StationLocation> {
        self.location
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn cache_location(&self, location: StationLocation) {
        *self
            .location
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(location);
    }
}

#[async_trait]
impl SessionContext for ConnectionSession {
    fn tenant_id(&self) -> &str {
        &self.identity.tenant.id
    }

    fn charging_station_id(&self) -> &str {
        &self.identity.charging_station_id
    }

    fn transport(&self) -> TransportKind {
        self.identity.transport
    }

    fn negotiated_version(&self) -> &str {
        &self.identity.negotiated_protocol
    }

    fn charging_station_url(&self) -> &str {
        &self.identity.charging_station_url
    }

    fn token_id(&self) -> Option<&str> {
        self.identity.token_id.as_deref()
    }

    fn client_address(&self) -> Option<&str> {
        self.identity.client_address.as_deref()
    }

    fn cached_location(&self) -> StationLocation {
        self.read_location().unwrap_or_default()
    }

    async fn connection_context(&self) -> DomainResult<ConnectionContext> {
        if let Some(location) = self.read_location() {
            return Ok(ConnectionContext {
                registered: true,
                location,
            });
        }

        let station = self
            .services
            .stations
            .find(&self.identity.tenant.id, &self.identity.charging_station_id)
            .await?;

        Ok(match station {
            Some(station) => {
                if station.location.is_resolved() {
                    self.cache_location(station.location.clone());
                }
                ConnectionContext {
                    registered: true,
                    location: station.location,
                }
            }
            None => ConnectionContext::default(),
        })
    }
}
