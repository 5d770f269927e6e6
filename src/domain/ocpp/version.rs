//! OCPP protocol version and transport
//!
//! Defines the negotiated OCPP versions and the transport kinds a station
//! may use. Header derivation differs per transport only in how the bare
//! version number is obtained from what was negotiated.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported OCPP protocol versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OcppVersion {
    /// OCPP 1.6 (JSON / OCPP-J)
    V16,
    /// OCPP 2.0.1
    V201,
    /// OCPP 2.1
    V21,
}

impl OcppVersion {
    /// WebSocket subprotocol identifier for this OCPP version.
    pub fn subprotocol(&self) -> &'static str {
        match self {
            Self::V16 => "ocpp1.6",
            Self::V201 => "ocpp2.0.1",
            Self::V21 => "ocpp2.1",
        }
    }

    /// Parse an OCPP version from a WebSocket subprotocol string.
    pub fn from_subprotocol(s: &str) -> Option<Self> {
        match s.trim() {
            "ocpp1.6" => Some(Self::V16),
            "ocpp2.0.1" => Some(Self::V201),
            "ocpp2.1" => Some(Self::V21),
            _ => None,
        }
    }

    /// Human-readable version string.
    pub fn version_string(&self) -> &'static str {
        match self {
            Self::V16 => "1.6",
            Self::V201 => "2.0.1",
            Self::V21 => "2.1",
        }
    }

    /// Preference rank used during negotiation (higher wins).
    pub fn rank(&self) -> u8 {
        match self {
            Self::V16 => 1,
            Self::V201 => 2,
            Self::V21 => 3,
        }
    }
}

impl fmt::Display for OcppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OCPP {}", self.version_string())
    }
}

/// Transport a station speaks OCPP over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// OCPP-J over WebSocket
    Json,
    /// OCPP-S (raw XML over SOAP/HTTP)
    Soap,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Soap => "soap",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "json" => Some(Self::Json),
            "soap" => Some(Self::Soap),
            _ => None,
        }
    }

    /// Bare version number from what the transport negotiated.
    ///
    /// JSON negotiates a subprotocol such as `ocpp1.6`, SOAP carries the
    /// bare number already.
    pub fn derive_version<'a>(&self, negotiated: &'a str) -> &'a str {
        match self {
            Self::Json => negotiated.strip_prefix("ocpp").unwrap_or(negotiated),
            Self::Soap => negotiated,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
