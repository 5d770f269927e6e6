//! Lock descriptors and stored lock records

use std::fmt;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::domain::DomainError;

/// Kind of entity a lock protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockEntity {
    Database,
    Tenant,
    ChargingStation,
    Transaction,
    Invoice,
}

impl LockEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Tenant => "tenant",
            Self::ChargingStation => "charging-station",
            Self::Transaction => "transaction",
            Self::Invoice => "invoice",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [
            Self::Database,
            Self::Tenant,
            Self::ChargingStation,
            Self::Transaction,
            Self::Invoice,
        ]
        .into_iter()
        .find(|e| e.as_str() == s)
    }
}

impl fmt::Display for LockEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named operation a lock serializes. Each action belongs to one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockAction {
    CheckChargingStationTemplate,
    CheckOfflineChargingStations,
    CheckStuckTransactions,
    SynchronizeBillingInvoices,
    MigrateTenantData,
}

impl LockAction {
    pub const ALL: [LockAction; 5] = [
        Self::CheckChargingStationTemplate,
        Self::CheckOfflineChargingStations,
        Self::CheckStuckTransactions,
        Self::SynchronizeBillingInvoices,
        Self::MigrateTenantData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckChargingStationTemplate => "check-charging-station-template",
            Self::CheckOfflineChargingStations => "check-offline-charging-stations",
            Self::CheckStuckTransactions => "check-stuck-transactions",
            Self::SynchronizeBillingInvoices => "synchronize-billing-invoices",
            Self::MigrateTenantData => "migrate-tenant-data",
        }
    }

    pub fn entity(&self) -> LockEntity {
        match self {
            Self::CheckChargingStationTemplate | Self::CheckOfflineChargingStations => {
                LockEntity::ChargingStation
            }
            Self::CheckStuckTransactions => LockEntity::Transaction,
            Self::SynchronizeBillingInvoices => LockEntity::Invoice,
            Self::MigrateTenantData => LockEntity::Database,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

impl fmt::Display for LockAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockType {
    Exclusive,
}

impl LockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exclusive => "E",
        }
    }
}

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock action '{action}' does not apply to entity '{entity}'")]
    InvalidDescriptor {
        entity: LockEntity,
        action: LockAction,
    },

    #[error("lock storage failure: {0}")]
    Storage(#[from] DomainError),
}

/// Lock descriptor: the (tenant, entity, action) triple plus its stable id.
///
/// Constructing one has no side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lock {
    pub id: String,
    pub tenant_id: String,
    pub entity: LockEntity,
    pub action: LockAction,
    pub lock_type: LockType,
}

impl Lock {
    pub fn exclusive(
        tenant_id: impl Into<String>,
        entity: LockEntity,
        action: LockAction,
    ) -> Result<Self, LockError> {
        if action.entity() != entity {
            return Err(LockError::InvalidDescriptor { entity, action });
        }
        let tenant_id = tenant_id.into();
        Ok(Self {
            id: Self::compute_id(&tenant_id, entity, action),
            tenant_id,
            entity,
            action,
            lock_type: LockType::Exclusive,
        })
    }

    /// Same triple, same id, in every process.
    fn compute_id(tenant_id: &str, entity: LockEntity, action: LockAction) -> String {
        let digest = Sha256::digest(format!("{}~{}~{}", tenant_id, entity, action).as_bytes());
        hex::encode(digest)
    }
}

impl fmt::Display for Lock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tenant_id, self.entity, self.action)
    }
}

/// A held lock as persisted by a [`super::LockRepository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRecord {
    pub lock: Lock,
    /// Process instance holding the lock
    pub holder: String,
    pub host_name: String,
    pub timestamp: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
}

impl LockRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_stable_and_scoped() {
        let a = Lock::exclusive(
            "t1",
            LockEntity::ChargingStation,
            LockAction::CheckChargingStationTemplate,
        )
        .unwrap();
        let a2 = Lock::exclusive(
            "t1",
            LockEntity::ChargingStation,
            LockAction::CheckChargingStationTemplate,
        )
        .unwrap();
        let b = Lock::exclusive(
            "t2",
            LockEntity::ChargingStation,
            LockAction::CheckChargingStationTemplate,
        )
        .unwrap();
        assert_eq!(a.id, a2.id);
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 64);
    }

    #[test]
    fn mismatched_entity_is_rejected() {
        let err = Lock::exclusive(
            "t1",
            LockEntity::Transaction,
            LockAction::CheckChargingStationTemplate,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LockError::InvalidDescriptor {
                entity: LockEntity::Transaction,
                action: LockAction::CheckChargingStationTemplate,
            }
        ));
    }

    #[test]
    fn names_parse_back() {
        for action in LockAction::ALL {
            assert_eq!(LockAction::parse(action.as_str()), Some(action));
            assert_eq!(LockEntity::parse(action.entity().as_str()), Some(action.entity()));
        }
    }
}
