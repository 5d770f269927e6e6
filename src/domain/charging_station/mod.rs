//! Charging Station aggregate
//!
//! Contains the charging station record, its runtime fields and the
//! repository interface.

pub mod model;
pub mod repository;

pub use model::{ChargingStation, RuntimeData, StationLocation};
pub use repository::{
    ChargingStationFilter, ChargingStationRepository, PageRequest, Sort, SortField,
};
