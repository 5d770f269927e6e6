//! In-memory storage implementation
//!
//! Used for development and tests. Locks are only exclusive within one
//! process; deploy the SeaORM backend when several instances share tenants.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::charging_station::{
    ChargingStationFilter, PageRequest, SortField,
};
use crate::domain::locking::LockRecord;
use crate::domain::{
    ChargingStation, ChargingStationRepository, DomainResult, LockRepository, RepositoryProvider,
    RuntimeData, Tenant, TenantRepository,
};

// ── Tenants ────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryTenantRepository {
    tenants: DashMap<String, Tenant>,
}

#[async_trait]
impl TenantRepository for InMemoryTenantRepository {
    async fn find_all(&self) -> DomainResult<Vec<Tenant>> {
        let mut tenants: Vec<Tenant> = self.tenants.iter().map(|t| t.value().clone()).collect();
        tenants.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tenants)
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Tenant>> {
        Ok(self.tenants.get(id).map(|t| t.clone()))
    }

    async fn save(&self, tenant: &Tenant) -> DomainResult<()> {
        self.tenants.insert(tenant.id.clone(), tenant.clone());
        Ok(())
    }
}

// ── Charging stations ──────────────────────────────────────────

/// Keyed by `(tenant_id, station_id)`.
#[derive(Default)]
pub struct InMemoryChargingStationRepository {
    stations: DashMap<(String, String), ChargingStation>,
}

impl InMemoryChargingStationRepository {
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

#[async_trait]
impl ChargingStationRepository for InMemoryChargingStationRepository {
    async fn find_by_id(&self, tenant_id: &str, id: &str) -> DomainResult<Option<ChargingStation>> {
        Ok(self
            .stations
            .get(&(tenant_id.to_string(), id.to_string()))
            .map(|cs| cs.clone()))
    }

    async fn find_page(
        &self,
        tenant_id: &str,
        filter: &ChargingStationFilter,
        page: &PageRequest,
    ) -> DomainResult<Vec<ChargingStation>> {
        let mut matching: Vec<ChargingStation> = self
            .stations
            .iter()
            .filter(|e| e.key().0 == tenant_id && filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();

        // Natural order is by id
        matching.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(sort) = page.sort {
            match sort.field {
                SortField::Id => {}
                SortField::LastSeen => matching.sort_by(|a, b| a.last_seen.cmp(&b.last_seen)),
            }
            if sort.descending {
                matching.reverse();
            }
        }

        Ok(matching
            .into_iter()
            .skip(page.skip as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn save(&self, tenant_id: &str, station: &ChargingStation) -> DomainResult<()> {
        let mut station = station.clone();
        station.last_changed_on = Some(Utc::now());
        self.stations
            .insert((tenant_id.to_string(), station.id.clone()), station);
        Ok(())
    }

    async fn save_runtime_data(
        &self,
        tenant_id: &str,
        id: &str,
        data: &RuntimeData,
    ) -> DomainResult<()> {
        if let Some(mut cs) = self
            .stations
            .get_mut(&(tenant_id.to_string(), id.to_string()))
        {
            cs.apply_runtime_data(data);
        }
        Ok(())
    }
}

// ── Locks ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryLockRepository {
    locks: DashMap<String, LockRecord>,
}

#[async_trait]
impl LockRepository for InMemoryLockRepository {
    async fn insert_if_absent(&self, record: &LockRecord) -> DomainResult<bool> {
        // The entry guard holds the shard lock, so check-and-insert is atomic
        match self.locks.entry(record.lock.id.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(true)
            }
        }
    }

    async fn delete_expired(&self, lock_id: &str, now: DateTime<Utc>) -> DomainResult<bool> {
        Ok(self
            .locks
            .remove_if(lock_id, |_, r| r.is_expired(now))
            .is_some())
    }

    async fn delete_held(&self, lock_id: &str, holder: &str) -> DomainResult<bool> {
        Ok(self
            .locks
            .remove_if(lock_id, |_, r| r.holder == holder)
            .is_some())
    }

    async fn find(&self, lock_id: &str) -> DomainResult<Option<LockRecord>> {
        Ok(self.locks.get(lock_id).map(|r| r.clone()))
    }
}

// ── Provider ───────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    tenants: InMemoryTenantRepository,
    charging_stations: InMemoryChargingStationRepository,
    locks: InMemoryLockRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concrete station store, for inspection in tests.
    pub fn station_store(&self) -> &InMemoryChargingStationRepository {
        &self.charging_stations
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
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
