//! Per-request OCPP header
//!
//! Built fresh by the dispatcher for every inbound command and dropped once
//! the handler returns.

use serde::Serialize;

use super::version::TransportKind;
use crate::domain::charging_station::StationLocation;

/// Connection-scoped data resolved from the live session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionContext {
    /// Whether a station record exists for this identity yet.
    pub registered: bool,
    #[serde(flatten)]
    pub location: StationLocation,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcppHeader {
    pub charge_box_identity: String,
    /// Bare version number, e.g. `1.6`.
    pub ocpp_version: String,
    pub ocpp_protocol: TransportKind,
    pub charging_station_url: String,
    pub tenant_id: String,
    pub token_id: Option<String>,
    pub from_address: Option<String>,
    pub current_ip_address: Option<String>,
    pub connection_context: ConnectionContext,
}
