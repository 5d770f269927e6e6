//! Charging station business logic service

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::domain::ocpp::TransportKind;
use crate::domain::{ChargingStation, DomainError, DomainResult, RepositoryProvider, RuntimeData};

/// Heartbeat interval announced in BootNotification responses (seconds).
pub const DEFAULT_HEARTBEAT_INTERVAL: u32 = 60;

/// What a station reports about itself on boot.
#[derive(Debug, Clone, Default)]
pub struct BootInfo {
    pub vendor: String,
    pub model: String,
    pub serial_number: Option<String>,
    pub firmware_version: Option<String>,
}

pub struct ChargingStationService {
    repos: Arc<dyn RepositoryProvider>,
    heartbeat_interval: u32,
    transaction_counter: AtomicI32,
}

impl ChargingStationService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self {
            repos,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            transaction_counter: AtomicI32::new(initial_transaction_id()),
        }
    }

    pub fn with_heartbeat_interval(mut self, seconds: u32) -> Self {
        self.heartbeat_interval = seconds;
        self
    }

    pub fn heartbeat_interval(&self) -> u32 {
        self.heartbeat_interval
    }

    pub async fn find(&self, tenant_id: &str, id: &str) -> DomainResult<Option<ChargingStation>> {
        self.repos.charging_stations().find_by_id(tenant_id, id).await
    }

    /// Create or refresh the station record on boot.
    pub async fn register_boot(
        &self,
        tenant_id: &str,
        id: &str,
        boot: &BootInfo,
        ocpp_version: &str,
        protocol: TransportKind,
    ) -> DomainResult<ChargingStation> {
        let existing = self.find(tenant_id, id).await?;
        let is_new = existing.is_none();
        let mut station = existing.unwrap_or_else(|| ChargingStation::new(id));

        station.issuer = true;
        station.vendor = Some(boot.vendor.clone());
        station.model = Some(boot.model.clone());
        station.serial_number = boot.serial_number.clone();
        station.firmware_version = boot.firmware_version.clone();
        station.ocpp_version = Some(ocpp_version.to_string());
        station.ocpp_protocol = Some(protocol);

        self.repos.charging_stations().save(tenant_id, &station).await?;

        info!(
            tenant_id,
            charging_station_id = id,
            vendor = boot.vendor.as_str(),
            model = boot.model.as_str(),
            is_new,
            "Charging station registered"
        );
        Ok(station)
    }

    pub async fn update_connector_status(
        &self,
        tenant_id: &str,
        id: &str,
        connector_id: u32,
        status: &str,
        error_code: &str,
    ) -> DomainResult<()> {
        let mut station = self
            .find(tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "ChargingStation",
                field: "id",
                value: id.to_string(),
            })?;
        station.set_connector_status(connector_id, status, error_code);
        self.repos.charging_stations().save(tenant_id, &station).await
    }

    /// Partial update of the runtime fields. Returns `false` when no record
    /// exists yet for this station, which is not an error.
    pub async fn update_runtime_data(
        &self,
        tenant_id: &str,
        id: &str,
        data: &RuntimeData,
    ) -> DomainResult<bool> {
        if self.find(tenant_id, id).await?.is_none() {
            debug!(
                tenant_id,
                charging_station_id = id,
                "No charging station record yet, runtime data not saved"
            );
            return Ok(false);
        }
        self.repos
            .charging_stations()
            .save_runtime_data(tenant_id, id, data)
            .await?;
        Ok(true)
    }

    /// Transaction ids handed to stations. Transactions themselves are
    /// owned by the billing backend.
    ///
    /// Ids are unique within one gateway process only. The counter starts
    /// at the current Unix time so a restart does not reuse recent ids, and
    /// wraps to 1 instead of going negative.
    pub fn next_transaction_id(&self) -> i32 {
        let previous = self
            .transaction_counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| {
                Some(id.checked_add(1).unwrap_or(1))
            });
        // The closure never returns None
        match previous {
            Ok(id) | Err(id) => id,
        }
    }
}

fn initial_transaction_id() -> i32 {
    i32::try_from(Utc::now().timestamp())
        .ok()
        .filter(|id| *id > 0)
        .unwrap_or(1)
}
