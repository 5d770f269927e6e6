//! Lock repository interface
//!
//! Implementations must make `insert_if_absent` atomic against every other
//! caller sharing the same store, including other processes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::LockRecord;
use crate::domain::DomainResult;

#[async_trait]
pub trait LockRepository: Send + Sync {
    /// Store the record unless a lock with the same id exists.
    /// Returns `true` when this call inserted it.
    async fn insert_if_absent(&self, record: &LockRecord) -> DomainResult<bool>;

    /// Remove the lock with this id if it expired before `now`.
    async fn delete_expired(&self, lock_id: &str, now: DateTime<Utc>) -> DomainResult<bool>;

    /// Remove the lock with this id if `holder` holds it.
    async fn delete_held(&self, lock_id: &str, holder: &str) -> DomainResult<bool>;

    async fn find(&self, lock_id: &str) -> DomainResult<Option<LockRecord>>;
}
