//! Session registry: live connection sessions by tenant and station

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, warn};

use super::client::ChargingStationClient;
use super::connection::ConnectionSession;

type SessionKey = (String, String);

/// Thread-safe registry of active sessions
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionKey, Arc<ConnectionSession>>,
}

/// Shared, reference-counted session registry
pub type SharedSessionRegistry = Arc<SessionRegistry>;

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedSessionRegistry {
        Arc::new(Self::new())
    }

    fn key(session: &ConnectionSession) -> SessionKey {
        let identity = session.identity();
        (
            identity.tenant.id.clone(),
            identity.charging_station_id.clone(),
        )
    }

    /// Register a session. A previous session of the same station is
    /// returned so the caller can close it.
    pub fn register(&self, session: Arc<ConnectionSession>) -> Option<Arc<ConnectionSession>> {
        let key = Self::key(&session);
        let evicted = self.sessions.insert(key.clone(), session);
        if evicted.is_some() {
            warn!(
                tenant_id = key.0.as_str(),
                charging_station_id = key.1.as_str(),
                "Station reconnected, previous session evicted"
            );
        } else {
            info!(
                tenant_id = key.0.as_str(),
                charging_station_id = key.1.as_str(),
                "Registering charging station session"
            );
        }
        evicted
    }

    /// Remove `session`, unless a newer session already replaced it.
    pub fn unregister(&self, session: &Arc<ConnectionSession>) {
        let key = Self::key(session);
        let removed = self
            .sessions
            .remove_if(&key, |_, current| Arc::ptr_eq(current, session));
        if removed.is_some() {
            info!(
                tenant_id = key.0.as_str(),
                charging_station_id = key.1.as_str(),
                "Unregistered charging station session"
            );
        }
    }

    pub fn get(&self, tenant_id: &str, charging_station_id: &str) -> Option<Arc<ConnectionSession>> {
        self.sessions
            .get(&(tenant_id.to_string(), charging_station_id.to_string()))
            .map(|s| s.clone())
    }

    pub fn client_for(&self, tenant_id: &str, charging_station_id: &str) -> Option<ChargingStationClient> {
        self.get(tenant_id, charging_station_id)
            .and_then(|s| s.client().cloned())
    }

    pub fn is_connected(&self, tenant_id: &str, charging_station_id: &str) -> bool {
        self.sessions
            .contains_key(&(tenant_id.to_string(), charging_station_id.to_string()))
    }

    pub fn connected_count(&self) -> usize {
        self.sessions.len()
    }

    /// Connected station ids of one tenant, sorted.
    pub fn connected_ids(&self, tenant_id: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .sessions
            .iter()
            .filter(|e| e.key().0 == tenant_id)
            .map(|e| e.key().1.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn all(&self) -> Vec<Arc<ConnectionSession>> {
        self.sessions.iter().map(|e| e.value().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::application::charging::dispatch::tracer::LoggingMessageTracer;
    use crate::application::charging::dispatch::{CommandDispatcher, HandlerRegistry};
    use crate::application::charging::services::ChargingStationService;
    use crate::application::charging::session::{HostAffinity, SessionIdentity, SessionServices};
    use crate::domain::ocpp::OcppVersion;
    use crate::domain::Tenant;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    fn session(tenant: &str, id: &str) -> Arc<ConnectionSession> {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let registry = HandlerRegistry::builder().build_partial().unwrap();
        let services = SessionServices {
            dispatcher: Arc::new(CommandDispatcher::new(
                Arc::new(registry),
                Arc::new(LoggingMessageTracer),
            )),
            stations: Arc::new(ChargingStationService::new(repos)),
            host: HostAffinity::default(),
            monitoring: false,
        };
        let identity = SessionIdentity::json(
            Tenant::new(tenant, tenant, tenant),
            id,
            OcppVersion::V16,
            "ws://localhost",
        );
        let (tx, _rx) = mpsc::unbounded_channel();
        Arc::new(ConnectionSession::new(identity, services, tx))
    }

    #[test]
    fn sessions_are_keyed_by_tenant_and_station() {
        let registry = SessionRegistry::new();
        registry.register(session("t1", "CS-1"));
        registry.register(session("t2", "CS-1"));
        registry.register(session("t1", "CS-2"));

        assert_eq!(registry.connected_count(), 3);
        assert_eq!(registry.connected_ids("t1"), vec!["CS-1", "CS-2"]);
        assert!(registry.is_connected("t2", "CS-1"));
        assert!(!registry.is_connected("t2", "CS-2"));
    }

    #[test]
    fn reconnect_evicts_and_stale_unregister_is_ignored() {
        let registry = SessionRegistry::new();
        let old = session("t1", "CS-1");
        let new = session("t1", "CS-1");

        assert!(registry.register(old.clone()).is_none());
        let evicted = registry.register(new.clone()).unwrap();
        assert!(Arc::ptr_eq(&evicted, &old));

        registry.unregister(&old);
        assert!(Arc::ptr_eq(&registry.get("t1", "CS-1").unwrap(), &new));

        registry.unregister(&new);
        assert!(!registry.is_connected("t1", "CS-1"));
    }

    #[test]
    fn client_is_available_after_initialize() {
        let registry = SessionRegistry::new();
        let s = session("t1", "CS-1");
        registry.register(s.clone());
        assert!(registry.client_for("t1", "CS-1").is_none());
        s.initialize().unwrap();
        assert!(registry.client_for("t1", "CS-1").is_some());
    }
}
