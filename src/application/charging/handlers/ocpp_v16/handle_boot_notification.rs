//! BootNotification handler

use chrono::Utc;
use rust_ocpp::v1_6::messages::boot_notification::{
    BootNotificationRequest, BootNotificationResponse,
};
use rust_ocpp::v1_6::types::RegistrationStatus;
use serde_json::Value;
use tracing::{error, info};

use super::{parse_request, to_payload};
use crate::application::charging::services::{BootInfo, ChargingStationService};
use crate::domain::ocpp::{Command, OcppError, OcppHeader};

pub async fn handle_boot_notification(
    service: &ChargingStationService,
    header: &OcppHeader,
    payload: &Value,
) -> Result<Value, OcppError> {
    let req: BootNotificationRequest = parse_request(header, Command::BootNotification, payload)?;

    info!(
        tenant_id = header.tenant_id.as_str(),
        charging_station_id = header.charge_box_identity.as_str(),
        vendor = req.charge_point_vendor.as_str(),
        model = req.charge_point_model.as_str(),
        ocpp_version = header.ocpp_version.as_str(),
        "BootNotification"
    );

    let boot = BootInfo {
        vendor: req.charge_point_vendor,
        model: req.charge_point_model,
        serial_number: req.charge_point_serial_number,
        firmware_version: req.firmware_version,
    };

    let status = match service
        .register_boot(
            &header.tenant_id,
            &header.charge_box_identity,
            &boot,
            &header.ocpp_version,
            header.ocpp_protocol,
        )
        .await
    {
        Ok(_) => RegistrationStatus::Accepted,
        Err(e) => {
            error!(
                tenant_id = header.tenant_id.as_str(),
                charging_station_id = header.charge_box_identity.as_str(),
                error = %e,
                "Failed to register charging station"
            );
            RegistrationStatus::Pending
        }
    };

    to_payload(&BootNotificationResponse {
        current_time: Utc::now(),
        interval: service.heartbeat_interval(),
        status,
    })
}
