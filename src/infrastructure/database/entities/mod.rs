//! Database entities module

pub mod charging_station;
pub mod lock;
pub mod tenant;

pub use charging_station::Entity as ChargingStation;
pub use lock::Entity as Lock;
pub use tenant::Entity as Tenant;
