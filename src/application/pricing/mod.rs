//! Transaction pricing over the external pricing engine

mod built_in;

pub use built_in::{BuiltInPricingIntegration, SimplePricingSettings};
