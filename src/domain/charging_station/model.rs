//! Charging Station domain entity

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::ocpp::TransportKind;

/// Site / site area / company a station is attached to.
///
/// Unresolved until the station record exists and has been assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationLocation {
    pub site_id: Option<String>,
    pub site_area_id: Option<String>,
    pub company_id: Option<String>,
}

impl StationLocation {
    pub fn is_resolved(&self) -> bool {
        self.site_area_id.is_some()
    }
}

/// Fields a live session refreshes with a partial update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeData {
    pub last_seen: DateTime<Utc>,
    pub token_id: Option<String>,
    pub cloud_host_ip: Option<String>,
    pub cloud_host_name: Option<String>,
}

/// Charging Station record
#[derive(Debug, Clone, PartialEq)]
pub struct ChargingStation {
    pub id: String,
    /// Owned by this tenant (as opposed to roaming stations)
    pub issuer: bool,
    /// A manually configured station never receives templates
    pub manual_configuration: bool,
    pub location: StationLocation,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub firmware_version: Option<String>,
    pub ocpp_version: Option<String>,
    pub ocpp_protocol: Option<TransportKind>,
    /// Hash of the last template applied to this station
    pub template_hash: Option<String>,
    pub ocpp_parameters: BTreeMap<String, String>,
    /// Everything else, saved as-is
    pub body: Map<String, Value>,
    pub last_seen: Option<DateTime<Utc>>,
    pub token_id: Option<String>,
    pub cloud_host_ip: Option<String>,
    pub cloud_host_name: Option<String>,
    pub created_on: DateTime<Utc>,
    pub last_changed_on: Option<DateTime<Utc>>,
}

impl ChargingStation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            issuer: true,
            manual_configuration: false,
            location: StationLocation::default(),
            vendor: None,
            model: None,
            serial_number: None,
            firmware_version: None,
            ocpp_version: None,
            ocpp_protocol: None,
            template_hash: None,
            ocpp_parameters: BTreeMap::new(),
            body: Map::new(),
            last_seen: None,
            token_id: None,
            cloud_host_ip: None,
            cloud_host_name: None,
            created_on: Utc::now(),
            last_changed_on: None,
        }
    }

    pub fn apply_runtime_data(&mut self, data: &RuntimeData) {
        self.last_seen = Some(data.last_seen);
        self.token_id = data.token_id.clone();
        self.cloud_host_ip = data.cloud_host_ip.clone();
        self.cloud_host_name = data.cloud_host_name.clone();
    }

    /// Record a connector status reported by the station.
    pub fn set_connector_status(&mut self, connector_id: u32, status: &str, error_code: &str) {
        let connectors = self
            .body
            .entry("connectors")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(connectors) = connectors {
            connectors.insert(
                connector_id.to_string(),
                serde_json::json!({ "status": status, "errorCode": error_code }),
            );
        }
    }

    pub fn connector_status(&self, connector_id: u32) -> Option<&str> {
        self.body
            .get("connectors")?
            .get(connector_id.to_string())?
            .get("status")?
            .as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_station_is_issuer_without_manual_configuration() {
        let cs = ChargingStation::new("CS-1");
        assert!(cs.issuer);
        assert!(!cs.manual_configuration);
        assert!(!cs.location.is_resolved());
    }

    #[test]
    fn runtime_data_overwrites_runtime_fields_only() {
        let mut cs = ChargingStation::new("CS-1");
        cs.vendor = Some("ACME".into());
        let now = Utc::now();
        cs.apply_runtime_data(&RuntimeData {
            last_seen: now,
            token_id: Some("tok".into()),
            cloud_host_ip: Some("10.0.0.1".into()),
            cloud_host_name: Some("gw-1".into()),
        });
        assert_eq!(cs.last_seen, Some(now));
        assert_eq!(cs.token_id.as_deref(), Some("tok"));
        assert_eq!(cs.vendor.as_deref(), Some("ACME"));
    }

    #[test]
    fn connector_status_is_kept_in_body() {
        let mut cs = ChargingStation::new("CS-1");
        cs.set_connector_status(1, "Charging", "NoError");
        cs.set_connector_status(2, "Available", "NoError");
        cs.set_connector_status(1, "Finishing", "NoError");
        assert_eq!(cs.connector_status(1), Some("Finishing"));
        assert_eq!(cs.connector_status(2), Some("Available"));
        assert_eq!(cs.connector_status(3), None);
    }
}
