//! Heartbeat handler
//!
//! Last-seen is refreshed by the session after every handled command.

use chrono::Utc;
use rust_ocpp::v1_6::messages::heart_beat::HeartbeatResponse;
use serde_json::Value;
use tracing::debug;

use super::to_payload;
use crate::application::charging::services::ChargingStationService;
use crate::domain::ocpp::{OcppError, OcppHeader};

pub async fn handle_heartbeat(
    _service: &ChargingStationService,
    header: &OcppHeader,
    _payload: &Value,
) -> Result<Value, OcppError> {
    debug!(
        tenant_id = header.tenant_id.as_str(),
        charging_station_id = header.charge_box_identity.as_str(),
        "Heartbeat"
    );

    to_payload(&HeartbeatResponse {
        current_time: Utc::now(),
    })
}
