//! Charging station template port
//!
//! Template resolution itself lives outside the gateway core; the scheduler
//! only needs to know whether applying the current template changed a
//! record. Applying a template must be idempotent.

use async_trait::async_trait;

use crate::domain::charging_station::ChargingStation;
use crate::domain::tenant::Tenant;
use crate::domain::DomainResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateUpdateResult {
    /// The record was mutated in place and needs saving
    pub charging_station_updated: bool,
}

impl TemplateUpdateResult {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn updated() -> Self {
        Self {
            charging_station_updated: true,
        }
    }
}

#[async_trait]
pub trait TemplateResolver: Send + Sync {
    async fn apply_if_needed(
        &self,
        tenant: &Tenant,
        station: &mut ChargingStation,
    ) -> DomainResult<TemplateUpdateResult>;
}
