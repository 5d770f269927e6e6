//! MeterValues handler

use rust_ocpp::v1_6::messages::meter_values::{MeterValuesRequest, MeterValuesResponse};
use serde_json::Value;
use tracing::info;

use super::{parse_request, to_payload};
use crate::application::charging::services::ChargingStationService;
use crate::domain::ocpp::{Command, OcppError, OcppHeader};

pub async fn handle_meter_values(
    _service: &ChargingStationService,
    header: &OcppHeader,
    payload: &Value,
) -> Result<Value, OcppError> {
    let req: MeterValuesRequest = parse_request(header, Command::MeterValues, payload)?;
    let samples: usize = req.meter_value.iter().map(|mv| mv.sampled_value.len()).sum();

    info!(
        tenant_id = header.tenant_id.as_str(),
        charging_station_id = header.charge_box_identity.as_str(),
        connector_id = req.connector_id,
        transaction_id = ?req.transaction_id,
        meter_values = req.meter_value.len(),
        samples,
        "MeterValues"
    );

    to_payload(&MeterValuesResponse {})
}
