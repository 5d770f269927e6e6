//! Pricing model and engine port

pub mod engine;
pub mod model;

pub use engine::PricingEngine;
pub use model::{
    Consumption, PricedConsumption, PricedDimension, PricedDimensions, PricingDefinition,
    PricingDimension, PricingDimensions, PricingSource, PricingTransaction, ResolvedPricingModel,
};
