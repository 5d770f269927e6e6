//! Pricing engine port

use async_trait::async_trait;

use super::model::{Consumption, PricedDimensions, PricingTransaction, ResolvedPricingModel};
use crate::domain::charging_station::ChargingStation;
use crate::domain::tenant::Tenant;
use crate::domain::DomainResult;

/// Prices consumption intervals. Implemented outside the gateway.
#[async_trait]
pub trait PricingEngine: Send + Sync {
    async fn resolve_pricing_context(
        &self,
        tenant: &Tenant,
        transaction: &PricingTransaction,
        station: &ChargingStation,
    ) -> DomainResult<ResolvedPricingModel>;

    fn price_consumption(
        &self,
        tenant: &Tenant,
        model: &ResolvedPricingModel,
        consumption: &Consumption,
    ) -> PricedDimensions;
}
