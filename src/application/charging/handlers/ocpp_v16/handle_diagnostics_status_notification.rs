//! DiagnosticsStatusNotification handler

use rust_ocpp::v1_6::messages::diagnostics_status_notification::{
    DiagnosticsStatusNotificationRequest, DiagnosticsStatusNotificationResponse,
};
use serde_json::Value;
use tracing::info;

use super::{parse_request, to_payload};
use crate::application::charging::services::ChargingStationService;
use crate::domain::ocpp::{Command, OcppError, OcppHeader};

pub async fn handle_diagnostics_status_notification(
    _service: &ChargingStationService,
    header: &OcppHeader,
    payload: &Value,
) -> Result<Value, OcppError> {
    let req: DiagnosticsStatusNotificationRequest =
        parse_request(header, Command::DiagnosticsStatusNotification, payload)?;

    info!(
        tenant_id = header.tenant_id.as_str(),
        charging_station_id = header.charge_box_identity.as_str(),
        status = ?req.status,
        "DiagnosticsStatusNotification"
    );

    to_payload(&DiagnosticsStatusNotificationResponse {})
}
