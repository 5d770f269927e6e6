//! Tenant snapshot used by the WebSocket handshake
//!
//! The handshake callback is synchronous, so tenants are resolved from a
//! snapshot taken before the upgrade. The snapshot is reloaded once it is
//! older than the refresh interval; new tenants become reachable within
//! that delay.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::domain::{DomainResult, RepositoryProvider, Tenant};

pub type TenantSnapshot = Arc<HashMap<String, Tenant>>;

struct Cached {
    loaded_at: Instant,
    tenants: TenantSnapshot,
}

pub struct TenantCache {
    repos: Arc<dyn RepositoryProvider>,
    refresh: Duration,
    cached: RwLock<Option<Cached>>,
}

impl TenantCache {
    pub fn new(repos: Arc<dyn RepositoryProvider>, refresh: Duration) -> Self {
        Self {
            repos,
            refresh,
            cached: RwLock::new(None),
        }
    }

    /// Current tenants by id, reloaded when stale.
    pub async fn snapshot(&self) -> DomainResult<TenantSnapshot> {
        if let Some(tenants) = self.fresh() {
            return Ok(tenants);
        }

        let tenants: TenantSnapshot = Arc::new(
            self.repos
                .tenants()
                .find_all()
                .await?
                .into_iter()
                .map(|t| (t.id.clone(), t))
                .collect(),
        );
        debug!(tenants = tenants.len(), "Tenant snapshot reloaded");

        *self
            .cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Cached {
            loaded_at: Instant::now(),
            tenants: tenants.clone(),
        });
        Ok(tenants)
    }

    fn fresh(&self) -> Option<TenantSnapshot> {
        let cached = self
            .cached
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cached
            .as_ref()
            .filter(|c| c.loaded_at.elapsed() < self.refresh)
            .map(|c| c.tenants.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    async fn repos() -> Arc<InMemoryRepositoryProvider> {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        repos
            .tenants()
            .save(&Tenant::new("t1", "acme", "ACME"))
            .await
            .unwrap();
        repos
    }

    #[tokio::test]
    async fn snapshot_is_reused_until_stale() {
        let repos = repos().await;
        let cache = TenantCache::new(repos.clone(), Duration::from_secs(3600));

        let first = cache.snapshot().await.unwrap();
        assert!(first.contains_key("t1"));

        repos
            .tenants()
            .save(&Tenant::new("t2", "beta", "Beta"))
            .await
            .unwrap();
        let second = cache.snapshot().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!second.contains_key("t2"));
    }

    #[tokio::test]
    async fn stale_snapshot_is_reloaded() {
        let repos = repos().await;
        let cache = TenantCache::new(repos.clone(), Duration::ZERO);
        assert_eq!(cache.snapshot().await.unwrap().len(), 1);

        repos
            .tenants()
            .save(&Tenant::new("t2", "beta", "Beta"))
            .await
            .unwrap();
        assert!(cache.snapshot().await.unwrap().contains_key("t2"));
    }
}
