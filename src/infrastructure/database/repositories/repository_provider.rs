//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::charging_station::ChargingStationRepository;
use crate::domain::locking::LockRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::tenant::TenantRepository;

use super::charging_station_repository::SeaOrmChargingStationRepository;
use super::lock_repository::SeaOrmLockRepository;
use super::tenant_repository::SeaOrmTenantRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let cs = repos.charging_stations().find_by_id("tenant-1", "CS001").await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    tenants: SeaOrmTenantRepository,
    charging_stations: SeaOrmChargingStationRepository,
    locks: SeaOrmLockRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            tenants: SeaOrmTenantRepository::new(db.clone()),
            charging_stations: SeaOrmChargingStationRepository::new(db.clone()),
            locks: SeaOrmLockRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn tenants(&self) -> &dyn TenantRepository {
        &self.tenants
    }

    fn charging_stations(&self) -> &dyn ChargingStationRepository {
        &self.charging_stations
    }

    fn locks(&self) -> &dyn LockRepository {
        &self.locks
    }
}
