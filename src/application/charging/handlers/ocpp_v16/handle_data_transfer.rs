//! DataTransfer handler

use rust_ocpp::v1_6::messages::data_transfer::{DataTransferRequest, DataTransferResponse};
use rust_ocpp::v1_6::types::DataTransferStatus;
use serde_json::Value;
use tracing::info;

use super::{parse_request, to_payload};
use crate::application::charging::services::ChargingStationService;
use crate::domain::ocpp::{Command, OcppError, OcppHeader};

pub async fn handle_data_transfer(
    _service: &ChargingStationService,
    header: &OcppHeader,
    payload: &Value,
) -> Result<Value, OcppError> {
    let req: DataTransferRequest = parse_request(header, Command::DataTransfer, payload)?;

    info!(
        tenant_id = header.tenant_id.as_str(),
        charging_station_id = header.charge_box_identity.as_str(),
        vendor_id = req.vendor_string.as_str(),
        message_id = ?req.message_id,
        "DataTransfer"
    );

    to_payload(&DataTransferResponse {
        status: DataTransferStatus::Accepted,
        data: None,
    })
}
