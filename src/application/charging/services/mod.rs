//! Application services

mod charging_station;

pub use charging_station::{BootInfo, ChargingStationService, DEFAULT_HEARTBEAT_INTERVAL};
