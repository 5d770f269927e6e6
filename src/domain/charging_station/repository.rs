//! Charging Station repository interface

use async_trait::async_trait;

use super::model::{ChargingStation, RuntimeData};
use crate::domain::DomainResult;

/// Field filter for paginated queries. `None` means "don't care".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChargingStationFilter {
    pub issuer: Option<bool>,
    pub manual_configuration: Option<bool>,
}

impl ChargingStationFilter {
    /// Stations a configuration template may be applied to.
    pub fn template_eligible() -> Self {
        Self {
            issuer: Some(true),
            manual_configuration: Some(false),
        }
    }

    pub fn matches(&self, station: &ChargingStation) -> bool {
        self.issuer.map_or(true, |v| station.issuer == v)
            && self
                .manual_configuration
                .map_or(true, |v| station.manual_configuration == v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    LastSeen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub descending: bool,
}

/// Offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u64,
    pub skip: u64,
    /// Without a sort key the backend's natural order is used
    pub sort: Option<Sort>,
}

impl PageRequest {
    pub fn first(limit: u64) -> Self {
        Self {
            limit,
            skip: 0,
            sort: None,
        }
    }

    /// The page after this one.
    pub fn next(self) -> Self {
        Self {
            skip: self.skip + self.limit,
            ..self
        }
    }
}

#[async_trait]
pub trait ChargingStationRepository: Send + Sync {
    async fn find_by_id(&self, tenant_id: &str, id: &str) -> DomainResult<Option<ChargingStation>>;

    /// One page of stations; an empty page means there is nothing left.
    async fn find_page(
        &self,
        tenant_id: &str,
        filter: &ChargingStationFilter,
        page: &PageRequest,
    ) -> DomainResult<Vec<ChargingStation>>;

    /// Save the whole record (insert or replace).
    async fn save(&self, tenant_id: &str, station: &ChargingStation) -> DomainResult<()>;

    /// Update only the runtime fields of an existing record.
    async fn save_runtime_data(
        &self,
        tenant_id: &str,
        id: &str,
        data: &RuntimeData,
    ) -> DomainResult<()>;
}
