//! Locking manager: tenant-scoped exclusive locks across backend instances
//!
//! Mutual exclusion rests entirely on the repository's atomic
//! `insert_if_absent`. Acquisition never waits: a `false` from
//! [`LockingManager::acquire`] means someone else holds the lock right now.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{Duration, Utc};
use futures_util::FutureExt;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::domain::locking::{Lock, LockAction, LockEntity, LockError, LockRecord};
use crate::domain::RepositoryProvider;

/// Default lock lifetime when a holder crashes without releasing.
pub const DEFAULT_LOCK_EXPIRY_SECS: u64 = 180;

/// Upper bound on the lock lifetime; longer configured values are clamped.
pub const MAX_LOCK_EXPIRY_SECS: u64 = 24 * 60 * 60;

pub struct LockingManager {
    repos: Arc<dyn RepositoryProvider>,
    /// Identifies this process as a lock holder
    holder: String,
    host_name: String,
    expiry: Duration,
}

pub type SharedLockingManager = Arc<LockingManager>;

impl LockingManager {
    pub fn new(repos: Arc<dyn RepositoryProvider>, expiry_secs: u64) -> Self {
        if expiry_secs > MAX_LOCK_EXPIRY_SECS {
            warn!(
                expiry_secs,
                max_expiry_secs = MAX_LOCK_EXPIRY_SECS,
                "Lock expiry too long, clamped"
            );
        }
        let expiry_secs = expiry_secs.min(MAX_LOCK_EXPIRY_SECS) as i64;
        Self {
            repos,
            holder: Uuid::new_v4().to_string(),
            host_name: "localhost".to_string(),
            expiry: Duration::seconds(expiry_secs),
        }
    }

    pub fn with_host_name(mut self, host_name: impl Into<String>) -> Self {
        self.host_name = host_name.into();
        self
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Build a lock descriptor. No side effect.
    pub fn create_exclusive_lock(
        &self,
        tenant_id: &str,
        entity: LockEntity,
        action: LockAction,
    ) -> Result<Lock, LockError> {
        Lock::exclusive(tenant_id, entity, action)
    }

    /// Try to take the lock. Returns `true` iff this process now holds it.
    pub async fn acquire(&self, lock: &Lock) -> Result<bool, LockError> {
        let now = Utc::now();
        let record = LockRecord {
            lock: lock.clone(),
            holder: self.holder.clone(),
            host_name: self.host_name.clone(),
            timestamp: now,
            expiration_date: now + self.expiry,
        };

        let locks = self.repos.locks();
        if locks.insert_if_absent(&record).await? {
            debug!(tenant_id = lock.tenant_id.as_str(), lock = %lock, "Lock acquired");
            return Ok(true);
        }

        // Holder may have crashed: reclaim an expired lock once
        if locks.delete_expired(&lock.id, now).await? {
            warn!(
                tenant_id = lock.tenant_id.as_str(),
                lock = %lock,
                "Expired lock reclaimed"
            );
            let acquired = locks.insert_if_absent(&record).await?;
            if acquired {
                debug!(tenant_id = lock.tenant_id.as_str(), lock = %lock, "Lock acquired");
            }
            return Ok(acquired);
        }

        debug!(tenant_id = lock.tenant_id.as_str(), lock = %lock, "Lock busy");
        Ok(false)
    }

    /// Give the lock back. Releasing a lock this process doesn't hold is a no-op.
    pub async fn release(&self, lock: &Lock) -> Result<(), LockError> {
        if self.repos.locks().delete_held(&lock.id, &self.holder).await? {
            debug!(tenant_id = lock.tenant_id.as_str(), lock = %lock, "Lock released");
        } else {
            debug!(
                tenant_id = lock.tenant_id.as_str(),
                lock = %lock,
                "Release of a lock not held by this process ignored"
            );
        }
        Ok(())
    }

    /// Run `work` while holding `lock`.
    ///
    /// Returns `Ok(None)` without running `work` when the lock is busy.
    /// The lock is released on every exit path; a panic inside `work` is
    /// resumed once the release has completed.
    pub async fn run_exclusive<F, T>(&self, lock: &Lock, work: F) -> Result<Option<T>, LockError>
    where
        F: Future<Output = T>,
    {
        if !self.acquire(lock).await? {
            return Ok(None);
        }

        let outcome = AssertUnwindSafe(work).catch_unwind().await;

        if let Err(e) = self.release(lock).await {
            error!(
                tenant_id = lock.tenant_id.as_str(),
                lock = %lock,
                error = %e,
                "Failed to release lock, it will expire on its own"
            );
        }

        match outcome {
            Ok(value) => Ok(Some(value)),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}
