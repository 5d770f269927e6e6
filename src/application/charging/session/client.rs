//! Central system → charging station calls
//!
//! Sends OCPP-J Call frames through the session's outbound channel. Matching
//! the station's CallResult back to the request is left to the caller.

use rust_ocpp::v1_6::messages::change_configuration::ChangeConfigurationRequest;
use rust_ocpp::v1_6::messages::clear_cache::ClearCacheRequest;
use rust_ocpp::v1_6::messages::reset::ResetRequest;
use rust_ocpp::v1_6::messages::trigger_message::TriggerMessageRequest;
use rust_ocpp::v1_6::types::{MessageTrigger, ResetRequestStatus};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::domain::ocpp::Command;
use crate::shared::ocpp_frame::OcppFrame;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("command '{0}' is sent by charging stations, not to them")]
    NotOutbound(Command),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("charging station {0} is disconnected")]
    Disconnected(String),
}

#[derive(Debug, Clone)]
pub struct ChargingStationClient {
    charging_station_id: String,
    outbound: mpsc::UnboundedSender<String>,
}

impl ChargingStationClient {
    pub fn new(charging_station_id: impl Into<String>, outbound: mpsc::UnboundedSender<String>) -> Self {
        Self {
            charging_station_id: charging_station_id.into(),
            outbound,
        }
    }

    /// Send a Call and return its unique id.
    pub fn send_call(&self, command: Command, payload: Value) -> Result<String, ClientError> {
        if command.is_inbound() {
            return Err(ClientError::NotOutbound(command));
        }
        let unique_id = Uuid::new_v4().to_string();
        let frame = OcppFrame::call(unique_id.clone(), command.as_str(), payload);
        self.outbound
            .send(frame.serialize())
            .map_err(|_| ClientError::Disconnected(self.charging_station_id.clone()))?;
        info!(
            charging_station_id = self.charging_station_id.as_str(),
            action = command.as_str(),
            unique_id = unique_id.as_str(),
            "Call sent to charging station"
        );
        Ok(unique_id)
    }

    fn send_request<T: Serialize>(&self, command: Command, request: &T) -> Result<String, ClientError> {
        self.send_call(command, serde_json::to_value(request)?)
    }

    pub fn reset(&self, kind: ResetRequestStatus) -> Result<String, ClientError> {
        self.send_request(Command::Reset, &ResetRequest { kind })
    }

    pub fn clear_cache(&self) -> Result<String, ClientError> {
        self.send_request(Command::ClearCache, &ClearCacheRequest {})
    }

    pub fn trigger_message(
        &self,
        requested_message: MessageTrigger,
        connector_id: Option<u32>,
    ) -> Result<String, ClientError> {
        self.send_request(
            Command::TriggerMessage,
            &TriggerMessageRequest {
                requested_message,
                connector_id,
            },
        )
    }

    pub fn change_configuration(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<String, ClientError> {
        self.send_request(
            Command::ChangeConfiguration,
            &ChangeConfigurationRequest {
                key: key.into(),
                value: value.into(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> (ChargingStationClient, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChargingStationClient::new("CS-1", tx), rx)
    }

    #[test]
    fn reset_is_framed_as_call() {
        let (client, mut rx) = client();
        let id = client.reset(ResetRequestStatus::Soft).unwrap();
        let frame = OcppFrame::parse(&rx.try_recv().unwrap()).unwrap();
        match frame {
            OcppFrame::Call {
                unique_id,
                action,
                payload,
            } => {
                assert_eq!(unique_id, id);
                assert_eq!(action, "Reset");
                assert_eq!(payload["type"], "Soft");
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn change_configuration_payload() {
        let (client, mut rx) = client();
        client
            .change_configuration("HeartbeatInterval", "120")
            .unwrap();
        let frame = OcppFrame::parse(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(
            frame,
            OcppFrame::call(
                frame.unique_id().to_string(),
                "ChangeConfiguration",
                serde_json::json!({"key": "HeartbeatInterval", "value": "120"})
            )
        );
    }

    #[test]
    fn inbound_commands_are_refused() {
        let (client, _rx) = client();
        assert!(matches!(
            client.send_call(Command::Heartbeat, serde_json::json!({})),
            Err(ClientError::NotOutbound(Command::Heartbeat))
        ));
    }

    #[test]
    fn closed_channel_reports_disconnect() {
        let (client, rx) = client();
        drop(rx);
        assert!(matches!(
            client.clear_cache(),
            Err(ClientError::Disconnected(id)) if id == "CS-1"
        ));
    }
}
