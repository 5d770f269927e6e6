//! Connection identity

use chrono::{DateTime, Utc};

use crate::domain::ocpp::{OcppVersion, TransportKind};
use crate::domain::Tenant;

/// Who is on the other end of a connection. Fixed for its lifetime.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub tenant: Tenant,
    pub charging_station_id: String,
    /// Protocol string as negotiated on the transport, e.g. `ocpp1.6`
    pub negotiated_protocol: String,
    pub transport: TransportKind,
    pub token_id: Option<String>,
    pub client_address: Option<String>,
    /// URL the station reaches this gateway on
    pub charging_station_url: String,
    pub connected_at: DateTime<Utc>,
}

impl SessionIdentity {
    pub fn json(
        tenant: Tenant,
        charging_station_id: impl Into<String>,
        version: OcppVersion,
        charging_station_url: impl Into<String>,
    ) -> Self {
        Self {
            tenant,
            charging_station_id: charging_station_id.into(),
            negotiated_protocol: version.subprotocol().to_string(),
            transport: TransportKind::Json,
            token_id: None,
            client_address: None,
            charging_station_url: charging_station_url.into(),
            connected_at: Utc::now(),
        }
    }

    pub fn with_token(mut self, token_id: Option<String>) -> Self {
        self.token_id = token_id;
        self
    }

    pub fn with_client_address(mut self, client_address: Option<String>) -> Self {
        self.client_address = client_address;
        self
    }
}

/// Which gateway instance a station is attached to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostAffinity {
    pub ip: Option<String>,
    pub name: Option<String>,
}
