//! Built-in pricing integration
//!
//! Prices a consumption interval with the tenant's pricing engine and sums
//! the priced dimensions. The pricing model is resolved once, at session
//! start, and carried by the transaction afterwards.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::domain::pricing::{
    Consumption, PricedConsumption, PricingDefinition, PricingDimension, PricingDimensions,
    PricingEngine, PricingSource, PricingTransaction, ResolvedPricingModel,
};
use crate::domain::{ChargingStation, DomainResult, Tenant};

/// Tenant pricing settings used when no tariff applies.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimplePricingSettings {
    pub currency: String,
    /// Per kWh
    pub price: Decimal,
}

impl Default for SimplePricingSettings {
    fn default() -> Self {
        Self {
            currency: "EUR".to_string(),
            price: Decimal::ZERO,
        }
    }
}

pub struct BuiltInPricingIntegration {
    tenant: Tenant,
    settings: SimplePricingSettings,
    engine: Arc<dyn PricingEngine>,
}

impl BuiltInPricingIntegration {
    pub fn new(tenant: Tenant, settings: SimplePricingSettings, engine: Arc<dyn PricingEngine>) -> Self {
        Self {
            tenant,
            settings,
            engine,
        }
    }

    pub async fn start_session(
        &self,
        transaction: &PricingTransaction,
        consumption: &Consumption,
        station: &ChargingStation,
    ) -> DomainResult<PricedConsumption> {
        self.compute_price(transaction, consumption, station).await
    }

    pub async fn update_session(
        &self,
        transaction: &PricingTransaction,
        consumption: &Consumption,
        station: &ChargingStation,
    ) -> DomainResult<PricedConsumption> {
        self.compute_price(transaction, consumption, station).await
    }

    pub async fn stop_session(
        &self,
        transaction: &PricingTransaction,
        consumption: &Consumption,
        station: &ChargingStation,
    ) -> DomainResult<PricedConsumption> {
        self.compute_price(transaction, consumption, station).await
    }

    async fn compute_price(
        &self,
        transaction: &PricingTransaction,
        consumption: &Consumption,
        station: &ChargingStation,
    ) -> DomainResult<PricedConsumption> {
        let pricing_model = match &transaction.pricing_model {
            Some(model) => model.clone(),
            // Only on the first call of a transaction
            None => self.resolve_pricing_context(transaction, station).await?,
        };

        let priced = self
            .engine
            .price_consumption(&self.tenant, &pricing_model, consumption);
        let amount = priced.total_amount();
        let rounded_amount = priced.total_rounded_amount();
        let cumulated_amount = transaction
            .current_cumulated_price
            .map_or(amount, |current| current + amount);

        debug!(
            tenant_id = self.tenant.id.as_str(),
            charging_station_id = station.id.as_str(),
            transaction_id = transaction.id,
            %amount,
            %cumulated_amount,
            "Consumption priced"
        );

        Ok(PricedConsumption {
            pricing_source: PricingSource::Simple,
            pricing_model,
            amount,
            rounded_amount,
            currency_code: self.settings.currency.clone(),
            cumulated_amount,
        })
    }

    async fn resolve_pricing_context(
        &self,
        transaction: &PricingTransaction,
        station: &ChargingStation,
    ) -> DomainResult<ResolvedPricingModel> {
        let mut model = self
            .engine
            .resolve_pricing_context(&self.tenant, transaction, station)
            .await?;
        if model.pricing_definitions.is_empty() {
            model.pricing_definitions = vec![self.default_pricing_definition()];
        }
        Ok(model)
    }

    fn default_pricing_definition(&self) -> PricingDefinition {
        PricingDefinition {
            name: "Default Tariff".to_string(),
            description: "Tariff based on simple pricing settings".to_string(),
            dimensions: PricingDimensions {
                energy: Some(PricingDimension::active(self.settings.price)),
                ..Default::default()
            },
        }
    }
}
