//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod charging_station_repository;
pub mod lock_repository;
pub mod repository_provider;
pub mod tenant_repository;

pub use charging_station_repository::SeaOrmChargingStationRepository;
pub use lock_repository::SeaOrmLockRepository;
pub use repository_provider::SeaOrmRepositoryProvider;
pub use tenant_repository::SeaOrmTenantRepository;

use crate::domain::DomainError;
use crate::shared::errors::InfraError;

pub(crate) fn db_err(e: sea_orm::DbErr) -> DomainError {
    InfraError::from(e).into()
}
