//! StatusNotification handler

use rust_ocpp::v1_6::messages::status_notification::{
    StatusNotificationRequest, StatusNotificationResponse,
};
use serde_json::Value;
use tracing::{info, warn};

use super::{parse_request, to_payload};
use crate::application::charging::services::ChargingStationService;
use crate::domain::ocpp::{Command, OcppError, OcppHeader};
use crate::domain::DomainError;

pub async fn handle_status_notification(
    service: &ChargingStationService,
    header: &OcppHeader,
    payload: &Value,
) -> Result<Value, OcppError> {
    let req: StatusNotificationRequest =
        parse_request(header, Command::StatusNotification, payload)?;
    let status = format!("{:?}", req.status);
    let error_code = format!("{:?}", req.error_code);

    info!(
        tenant_id = header.tenant_id.as_str(),
        charging_station_id = header.charge_box_identity.as_str(),
        connector_id = req.connector_id,
        status = status.as_str(),
        error_code = error_code.as_str(),
        "StatusNotification"
    );

    match service
        .update_connector_status(
            &header.tenant_id,
            &header.charge_box_identity,
            req.connector_id,
            &status,
            &error_code,
        )
        .await
    {
        Ok(()) => {}
        Err(DomainError::NotFound { .. }) => warn!(
            tenant_id = header.tenant_id.as_str(),
            charging_station_id = header.charge_box_identity.as_str(),
            "StatusNotification before BootNotification, status not stored"
        ),
        Err(e) => return Err(OcppError::internal(e.to_string())),
    }

    to_payload(&StatusNotificationResponse {})
}
