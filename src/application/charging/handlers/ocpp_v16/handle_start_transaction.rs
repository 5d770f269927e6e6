//! StartTransaction handler

use rust_ocpp::v1_6::messages::start_transaction::{
    StartTransactionRequest, StartTransactionResponse,
};
use rust_ocpp::v1_6::types::{AuthorizationStatus, IdTagInfo};
use serde_json::Value;
use tracing::info;

use super::{parse_request, to_payload};
use crate::application::charging::services::ChargingStationService;
use crate::domain::ocpp::{Command, OcppError, OcppHeader};

pub async fn handle_start_transaction(
    service: &ChargingStationService,
    header: &OcppHeader,
    payload: &Value,
) -> Result<Value, OcppError> {
    let req: StartTransactionRequest = parse_request(header, Command::StartTransaction, payload)?;
    let transaction_id = service.next_transaction_id();

    info!(
        tenant_id = header.tenant_id.as_str(),
        charging_station_id = header.charge_box_identity.as_str(),
        connector_id = req.connector_id,
        id_tag = req.id_tag.as_str(),
        meter_start = req.meter_start,
        transaction_id,
        "StartTransaction"
    );

    to_payload(&StartTransactionResponse {
        transaction_id,
        id_tag_info: IdTagInfo {
            status: AuthorizationStatus::Accepted,
            expiry_date: None,
            parent_id_tag: None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn transaction_ids_are_distinct() {
        let (service, _) = test_support::service();
        let header = test_support::header();
        let payload = json!({
            "connectorId": 1,
            "idTag": "TAG-1",
            "meterStart": 0,
            "timestamp": "2024-01-01T00:00:00Z"
        });

        let a = handle_start_transaction(&service, &header, &payload).await.unwrap();
        let b = handle_start_transaction(&service, &header, &payload).await.unwrap();
        assert_ne!(a["transactionId"], b["transactionId"]);
        assert_eq!(a["idTagInfo"]["status"], "Accepted");
    }
}
