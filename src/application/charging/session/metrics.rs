//! Session monitoring counters
//!
//! - **`ocpp_websocket_opened_total`**: counter with label `tenant`
//! - **`ocpp_websocket_closed_total`**: counter with label `tenant`

use metrics::Counter;

/// Owned by the session that increments them.
#[derive(Clone)]
pub struct SessionMetrics {
    pub opened: Counter,
    pub closed: Counter,
}

impl SessionMetrics {
    pub fn for_tenant(tenant_subdomain: &str) -> Self {
        Self {
            opened: metrics::counter!(
                "ocpp_websocket_opened_total",
                "tenant" => tenant_subdomain.to_string()
            ),
            closed: metrics::counter!(
                "ocpp_websocket_closed_total",
                "tenant" => tenant_subdomain.to_string()
            ),
        }
    }
}
