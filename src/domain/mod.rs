//! Domain layer: entities, value objects and ports.

pub mod charging_station;
pub mod locking;
pub mod ocpp;
pub mod ports;
pub mod pricing;
pub mod repositories;
pub mod template;
pub mod tenant;

pub use charging_station::{ChargingStation, ChargingStationRepository, RuntimeData, StationLocation};
pub use locking::{Lock, LockAction, LockEntity, LockError, LockRepository};
pub use ocpp::{Command, OcppError, OcppErrorType, OcppHeader, OcppVersion, TransportKind};
pub use repositories::{DomainResult, RepositoryProvider};
pub use template::{TemplateResolver, TemplateUpdateResult};
pub use tenant::{Tenant, TenantRepository};

pub use crate::shared::errors::DomainError;
