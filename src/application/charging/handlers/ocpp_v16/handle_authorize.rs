//! Authorize handler

use rust_ocpp::v1_6::messages::authorize::{AuthorizeRequest, AuthorizeResponse};
use rust_ocpp::v1_6::types::{AuthorizationStatus, IdTagInfo};
use serde_json::Value;
use tracing::info;

use super::{parse_request, to_payload};
use crate::application::charging::services::ChargingStationService;
use crate::domain::ocpp::{Command, OcppError, OcppHeader};

pub async fn handle_authorize(
    _service: &ChargingStationService,
    header: &OcppHeader,
    payload: &Value,
) -> Result<Value, OcppError> {
    let req: AuthorizeRequest = parse_request(header, Command::Authorize, payload)?;

    // Tag lists live with the billing backend; any well-formed tag is let through
    let status = if req.id_tag.trim().is_empty() {
        AuthorizationStatus::Invalid
    } else {
        AuthorizationStatus::Accepted
    };

    info!(
        tenant_id = header.tenant_id.as_str(),
        charging_station_id = header.charge_box_identity.as_str(),
        id_tag = req.id_tag.as_str(),
        ?status,
        "Authorize"
    );

    to_payload(&AuthorizeResponse {
        id_tag_info: IdTagInfo {
            status,
            expiry_date: None,
            parent_id_tag: None,
        },
    })
}
