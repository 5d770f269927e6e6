//! Storage implementations that don't need a database

mod memory;

pub use memory::{
    InMemoryChargingStationRepository, InMemoryLockRepository, InMemoryRepositoryProvider,
    InMemoryTenantRepository,
};
