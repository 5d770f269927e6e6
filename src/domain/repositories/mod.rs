//! Repository access for the domain layer
//!
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::charging_station::ChargingStationRepository;
use super::locking::LockRepository;
use super::tenant::TenantRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let cs = repos.charging_stations().find_by_id("tenant-1", "CS001").await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn tenants(&self) -> &dyn TenantRepository;
    fn charging_stations(&self) -> &dyn ChargingStationRepository;
    fn locks(&self) -> &dyn LockRepository;
}
