//! FirmwareStatusNotification handler

use rust_ocpp::v1_6::messages::firmware_status_notification::{
    FirmwareStatusNotificationRequest, FirmwareStatusNotificationResponse,
};
use serde_json::Value;
use tracing::info;

use super::{parse_request, to_payload};
use crate::application::charging::services::ChargingStationService;
use crate::domain::ocpp::{Command, OcppError, OcppHeader};

pub async fn handle_firmware_status_notification(
    _service: &ChargingStationService,
    header: &OcppHeader,
    payload: &Value,
) -> Result<Value, OcppError> {
    let req: FirmwareStatusNotificationRequest =
        parse_request(header, Command::FirmwareStatusNotification, payload)?;

    info!(
        tenant_id = header.tenant_id.as_str(),
        charging_station_id = header.charge_box_identity.as_str(),
        status = ?req.status,
        "FirmwareStatusNotification"
    );

    to_payload(&FirmwareStatusNotificationResponse {})
}
