//! OCPP 1.6 command names
//!
//! The full command catalogue is enumerated so that a station sending a
//! known central-system command (e.g. `Reset`) can be told apart from one
//! sending garbage. Only [`Command::INBOUND`] may arrive from a station.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    // ── Charging station → central system ──
    Authorize,
    BootNotification,
    DataTransfer,
    DiagnosticsStatusNotification,
    FirmwareStatusNotification,
    Heartbeat,
    MeterValues,
    StartTransaction,
    StatusNotification,
    StopTransaction,

    // ── Central system → charging station ──
    CancelReservation,
    ChangeAvailability,
    ChangeConfiguration,
    ClearCache,
    ClearChargingProfile,
    GetCompositeSchedule,
    GetConfiguration,
    GetDiagnostics,
    GetLocalListVersion,
    RemoteStartTransaction,
    RemoteStopTransaction,
    ReserveNow,
    Reset,
    SendLocalList,
    SetChargingProfile,
    TriggerMessage,
    UnlockConnector,
    UpdateFirmware,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown OCPP command '{0}'")]
pub struct UnknownCommand(pub String);

impl Command {
    /// Commands a charging station is allowed to send.
    pub const INBOUND: [Command; 10] = [
        Command::Authorize,
        Command::BootNotification,
        Command::DataTransfer,
        Command::DiagnosticsStatusNotification,
        Command::FirmwareStatusNotification,
        Command::Heartbeat,
        Command::MeterValues,
        Command::StartTransaction,
        Command::StatusNotification,
        Command::StopTransaction,
    ];

    pub const ALL: [Command; 28] = [
        Command::Authorize,
        Command::BootNotification,
        Command::DataTransfer,
        Command::DiagnosticsStatusNotification,
        Command::FirmwareStatusNotification,
        Command::Heartbeat,
        Command::MeterValues,
        Command::StartTransaction,
        Command::StatusNotification,
        Command::StopTransaction,
        Command::CancelReservation,
        Command::ChangeAvailability,
        Command::ChangeConfiguration,
        Command::ClearCache,
        Command::ClearChargingProfile,
        Command::GetCompositeSchedule,
        Command::GetConfiguration,
        Command::GetDiagnostics,
        Command::GetLocalListVersion,
        Command::RemoteStartTransaction,
        Command::RemoteStopTransaction,
        Command::ReserveNow,
        Command::Reset,
        Command::SendLocalList,
        Command::SetChargingProfile,
        Command::TriggerMessage,
        Command::UnlockConnector,
        Command::UpdateFirmware,
    ];

    /// Wire name, as carried in the OCPP-J `action` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authorize => "Authorize",
            Self::BootNotification => "BootNotification",
            Self::DataTransfer => "DataTransfer",
            Self::DiagnosticsStatusNotification => "DiagnosticsStatusNotification",
            Self::FirmwareStatusNotification => "FirmwareStatusNotification",
            Self::Heartbeat => "Heartbeat",
            Self::MeterValues => "MeterValues",
            Self::StartTransaction => "StartTransaction",
            Self::StatusNotification => "StatusNotification",
            Self::StopTransaction => "StopTransaction",
            Self::CancelReservation => "CancelReservation",
            Self::ChangeAvailability => "ChangeAvailability",
            Self::ChangeConfiguration => "ChangeConfiguration",
            Self::ClearCache => "ClearCache",
            Self::ClearChargingProfile => "ClearChargingProfile",
            Self::GetCompositeSchedule => "GetCompositeSchedule",
            Self::GetConfiguration => "GetConfiguration",
            Self::GetDiagnostics => "GetDiagnostics",
            Self::GetLocalListVersion => "GetLocalListVersion",
            Self::RemoteStartTransaction => "RemoteStartTransaction",
            Self::RemoteStopTransaction => "RemoteStopTransaction",
            Self::ReserveNow => "ReserveNow",
            Self::Reset => "Reset",
            Self::SendLocalList => "SendLocalList",
            Self::SetChargingProfile => "SetChargingProfile",
            Self::TriggerMessage => "TriggerMessage",
            Self::UnlockConnector => "UnlockConnector",
            Self::UpdateFirmware => "UpdateFirmware",
        }
    }

    pub fn is_inbound(&self) -> bool {
        Self::INBOUND.contains(self)
    }

    /// Server action label used in logs and traces, e.g. `OcppBootNotification`.
    pub fn server_action(&self) -> String {
        format!("Ocpp{}", self.as_str())
    }
}

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names() {
        assert_eq!("Heartbeat".parse::<Command>(), Ok(Command::Heartbeat));
        assert_eq!(
            "heartbeat".parse::<Command>(),
            Err(UnknownCommand("heartbeat".into()))
        );
    }

    #[test]
    fn inbound_allow_list() {
        assert!(Command::BootNotification.is_inbound());
        assert!(Command::StopTransaction.is_inbound());
        assert!(!Command::Reset.is_inbound());
        assert!(!Command::RemoteStartTransaction.is_inbound());
        assert_eq!(Command::ALL.iter().filter(|c| c.is_inbound()).count(), 10);
    }

    #[test]
    fn server_action_label() {
        assert_eq!(Command::MeterValues.server_action(), "OcppMeterValues");
    }
}
