//! OCPP 1.6 default handlers
//!
//! One module per inbound action. Payloads are deserialized into
//! `rust_ocpp::v1_6` request types; a payload that doesn't fit is answered
//! with a `FormationViolation`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::application::charging::dispatch::{HandlerRegistry, OcppCommandHandler, RegistryError};
use crate::application::charging::services::ChargingStationService;
use crate::domain::ocpp::{Command, OcppError, OcppErrorType, OcppHeader};

mod handle_authorize;
mod handle_boot_notification;
mod handle_data_transfer;
mod handle_diagnostics_status_notification;
mod handle_firmware_status_notification;
mod handle_heartbeat;
mod handle_meter_values;
mod handle_start_transaction;
mod handle_status_notification;
mod handle_stop_transaction;

pub use handle_authorize::handle_authorize;
pub use handle_boot_notification::handle_boot_notification;
pub use handle_data_transfer::handle_data_transfer;
pub use handle_diagnostics_status_notification::handle_diagnostics_status_notification;
pub use handle_firmware_status_notification::handle_firmware_status_notification;
pub use handle_heartbeat::handle_heartbeat;
pub use handle_meter_values::handle_meter_values;
pub use handle_start_transaction::handle_start_transaction;
pub use handle_status_notification::handle_status_notification;
pub use handle_stop_transaction::handle_stop_transaction;

/// Binds one inbound command to its 1.6 handler function.
pub struct OcppV16Handler {
    command: Command,
    service: Arc<ChargingStationService>,
}

impl OcppV16Handler {
    pub fn new(command: Command, service: Arc<ChargingStationService>) -> Self {
        Self { command, service }
    }
}

#[async_trait]
impl OcppCommandHandler for OcppV16Handler {
    async fn handle(&self, header: &OcppHeader, payload: &Value) -> Result<Value, OcppError> {
        let service = self.service.as_ref();
        match self.command {
            Command::Authorize => handle_authorize(service, header, payload).await,
            Command::BootNotification => handle_boot_notification(service, header, payload).await,
            Command::DataTransfer => handle_data_transfer(service, header, payload).await,
            Command::DiagnosticsStatusNotification => {
                handle_diagnostics_status_notification(service, header, payload).await
            }
            Command::FirmwareStatusNotification => {
                handle_firmware_status_notification(service, header, payload).await
            }
            Command::Heartbeat => handle_heartbeat(service, header, payload).await,
            Command::MeterValues => handle_meter_values(service, header, payload).await,
            Command::StartTransaction => handle_start_transaction(service, header, payload).await,
            Command::StatusNotification => {
                handle_status_notification(service, header, payload).await
            }
            Command::StopTransaction => handle_stop_transaction(service, header, payload).await,
            other => Err(OcppError::new(
                OcppErrorType::NotSupported,
                format!("{} is not handled by charging stations' requests", other),
            )),
        }
    }
}

impl HandlerRegistry {
    /// Registry with the default 1.6 handler bound to every inbound command.
    pub fn v16_defaults(service: Arc<ChargingStationService>) -> Result<Self, RegistryError> {
        Command::INBOUND
            .into_iter()
            .fold(HandlerRegistry::builder(), |builder, command| {
                builder.bind(
                    command,
                    Arc::new(OcppV16Handler::new(command, service.clone())),
                )
            })
            .build()
    }
}

/// Deserialize a request payload.
pub(crate) fn parse_request<T: DeserializeOwned>(
    header: &OcppHeader,
    command: Command,
    payload: &Value,
) -> Result<T, OcppError> {
    serde_json::from_value(payload.clone()).map_err(|e| {
        warn!(
            tenant_id = header.tenant_id.as_str(),
            charging_station_id = header.charge_box_identity.as_str(),
            action = command.as_str(),
            error = %e,
            "Failed to deserialize request"
        );
        OcppError::formation_violation(format!("Invalid {} payload: {}", command, e))
    })
}

pub(crate) fn to_payload<T: Serialize>(response: &T) -> Result<Value, OcppError> {
    serde_json::to_value(response)
        .map_err(|e| OcppError::internal(format!("Failed to serialize response: {}", e)))
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_bind_every_inbound_command() {
        let (service, _) = test_support::service();
        let registry = HandlerRegistry::v16_defaults(service).unwrap();
        assert!(registry.unbound().is_empty());
        assert_eq!(registry.len(), Command::INBOUND.len());
    }

    #[tokio::test]
    async fn malformed_payload_is_formation_violation() {
        let (service, _) = test_support::service();
        let handler = OcppV16Handler::new(Command::StartTransaction, service);
        let err = handler
            .handle(&test_support::header(), &json!({"connectorId": "one"}))
            .await
            .unwrap_err();
        assert_eq!(err.code, OcppErrorType::FormationViolation);
    }
}
