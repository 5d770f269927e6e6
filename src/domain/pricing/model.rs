//! Pricing value objects

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// One billable dimension of a tariff.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingDimension {
    pub active: bool,
    pub price: Decimal,
    /// Billing granularity (Wh for energy, seconds for time dimensions)
    pub step_size: Option<u32>,
}

impl PricingDimension {
    pub fn active(price: Decimal) -> Self {
        Self {
            active: true,
            price,
            step_size: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingDimensions {
    pub flat_fee: Option<PricingDimension>,
    pub energy: Option<PricingDimension>,
    pub charging_time: Option<PricingDimension>,
    pub parking_time: Option<PricingDimension>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricingDefinition {
    pub name: String,
    pub description: String,
    pub dimensions: PricingDimensions,
}

/// Tariffs applicable to one transaction, fixed at its start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedPricingModel {
    pub pricing_definitions: Vec<PricingDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricedDimension {
    pub amount: Decimal,
    pub rounded_amount: Decimal,
}

/// Engine output, per dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricedDimensions {
    pub flat_fee: Option<PricedDimension>,
    pub energy: Option<PricedDimension>,
    pub charging_time: Option<PricedDimension>,
    pub parking_time: Option<PricedDimension>,
}

impl PricedDimensions {
    fn all(&self) -> [Option<&PricedDimension>; 4] {
        [
            self.flat_fee.as_ref(),
            self.energy.as_ref(),
            self.charging_time.as_ref(),
            self.parking_time.as_ref(),
        ]
    }

    pub fn total_amount(&self) -> Decimal {
        self.all().into_iter().flatten().map(|d| d.amount).sum()
    }

    pub fn total_rounded_amount(&self) -> Decimal {
        self.all().into_iter().flatten().map(|d| d.rounded_amount).sum()
    }
}

/// A metered consumption interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Consumption {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub consumption_wh: Decimal,
    pub cumulated_consumption_wh: Decimal,
}

/// The slice of a transaction pricing needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingTransaction {
    pub id: i64,
    pub charging_station_id: String,
    pub pricing_model: Option<ResolvedPricingModel>,
    pub current_cumulated_price: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingSource {
    Simple,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedConsumption {
    pub pricing_source: PricingSource,
    pub pricing_model: ResolvedPricingModel,
    pub amount: Decimal,
    pub rounded_amount: Decimal,
    pub currency_code: String,
    pub cumulated_amount: Decimal,
}
