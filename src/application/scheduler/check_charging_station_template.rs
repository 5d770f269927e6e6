//! Apply the current configuration template to every eligible station
//!
//! Runs under the tenant's `check-charging-station-template` lock so that only
//! one backend instance reconciles a tenant at a time. One bad record never
//! stops the run: its error is logged and the loop moves on.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use tracing::{debug, error, info};

use super::task::{TaskError, TenantSchedulerTask};
use crate::application::locking::SharedLockingManager;
use crate::domain::charging_station::{ChargingStationFilter, PageRequest};
use crate::domain::{
    ChargingStation, DomainResult, LockAction, LockEntity, RepositoryProvider, TemplateResolver,
    Tenant,
};

pub const DEFAULT_BATCH_PAGE_SIZE: u64 = 100;

const ACTION: &str = "UpdateChargingStationWithTemplate";

/// Outcome of one tenant run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateRunSummary {
    /// Pages fetched, the empty terminating page included
    pub pages: u64,
    pub processed: u64,
    pub updated: u64,
    pub failed: u64,
}

pub struct CheckChargingStationTemplateTask {
    repos: Arc<dyn RepositoryProvider>,
    locking: SharedLockingManager,
    resolver: Arc<dyn TemplateResolver>,
    page_size: u64,
}

impl CheckChargingStationTemplateTask {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        locking: SharedLockingManager,
        resolver: Arc<dyn TemplateResolver>,
    ) -> Self {
        Self {
            repos,
            locking,
            resolver,
            page_size: DEFAULT_BATCH_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Run for one tenant. `None` means another holder has the lock and the
    /// tenant was skipped for this tick.
    pub async fn run(&self, tenant: &Tenant) -> Result<Option<TemplateRunSummary>, TaskError> {
        let lock = self.locking.create_exclusive_lock(
            &tenant.id,
            LockEntity::ChargingStation,
            LockAction::CheckChargingStationTemplate,
        )?;

        let Some(summary) = self
            .locking
            .run_exclusive(&lock, self.apply_templates(tenant))
            .await?
        else {
            debug!(
                tenant_id = tenant.id.as_str(),
                lock = %lock,
                "Template check skipped, lock held elsewhere"
            );
            metrics::counter!("scheduler_lock_skipped_total", "task" => self.name()).increment(1);
            return Ok(None);
        };

        if summary.updated > 0 {
            info!(
                tenant_id = tenant.id.as_str(),
                action = ACTION,
                updated = summary.updated,
                failed = summary.failed,
                "{} Charging Station(s) have been updated with template in tenant {}",
                summary.updated,
                tenant
            );
            metrics::counter!(
                "scheduler_template_updates_total",
                "tenant" => tenant.subdomain.clone()
            )
            .increment(summary.updated);
        }
        Ok(Some(summary))
    }

    async fn apply_templates(&self, tenant: &Tenant) -> TemplateRunSummary {
        let filter = ChargingStationFilter::template_eligible();
        let mut page = PageRequest::first(self.page_size);
        let mut summary = TemplateRunSummary::default();

        loop {
            summary.pages += 1;
            let stations = match self
                .repos
                .charging_stations()
                .find_page(&tenant.id, &filter, &page)
                .await
            {
                Ok(stations) => stations,
                Err(e) => {
                    error!(
                        tenant_id = tenant.id.as_str(),
                        action = ACTION,
                        skip = page.skip,
                        error = %e,
                        "Failed to fetch charging stations, run aborted"
                    );
                    break;
                }
            };
            if stations.is_empty() {
                break;
            }

            for mut station in stations {
                summary.processed += 1;
                let outcome = AssertUnwindSafe(self.apply_one(tenant, &mut station))
                    .catch_unwind()
                    .await;
                match outcome {
                    Ok(Ok(true)) => summary.updated += 1,
                    Ok(Ok(false)) => {}
                    Ok(Err(e)) => {
                        summary.failed += 1;
                        error!(
                            tenant_id = tenant.id.as_str(),
                            charging_station_id = station.id.as_str(),
                            action = ACTION,
                            error = %e,
                            "Template update error"
                        );
                    }
                    Err(_) => {
                        summary.failed += 1;
                        error!(
                            tenant_id = tenant.id.as_str(),
                            charging_station_id = station.id.as_str(),
                            action = ACTION,
                            "Template update panicked"
                        );
                    }
                }
            }

            page = page.next();
        }

        summary
    }

    async fn apply_one(&self, tenant: &Tenant, station: &mut ChargingStation) -> DomainResult<bool> {
        let result = self.resolver.apply_if_needed(tenant, station).await?;
        if !result.charging_station_updated {
            return Ok(false);
        }
        self.repos.charging_stations().save(&tenant.id, station).await?;
        Ok(true)
    }
}

#[async_trait]
impl TenantSchedulerTask for CheckChargingStationTemplateTask {
    fn name(&self) -> &'static str {
        "check-charging-station-template"
    }

    async fn process_tenant(&self, tenant: &Tenant) -> Result<(), TaskError> {
        self.run(tenant).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::application::locking::LockingManager;
    use crate::domain::charging_station::RuntimeData;
    use crate::domain::{
        ChargingStationRepository, DomainError, Lock, LockRepository, TemplateUpdateResult,
        TenantRepository,
    };
    use crate::infrastructure::storage::{
        InMemoryChargingStationRepository, InMemoryLockRepository, InMemoryTenantRepository,
    };

    /// Station store that counts page fetches.
    #[derive(Default)]
    struct CountingStations {
        inner: InMemoryChargingStationRepository,
        page_fetches: AtomicUsize,
    }

    #[async_trait]
    impl ChargingStationRepository for CountingStations {
        async fn find_by_id(&self, tenant_id: &str, id: &str) -> DomainResult<Option<ChargingStation>> {
            self.inner.find_by_id(tenant_id, id).await
        }

        async fn find_page(
            &self,
            tenant_id: &str,
            filter: &ChargingStationFilter,
            page: &PageRequest,
        ) -> DomainResult<Vec<ChargingStation>> {
            self.page_fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.find_page(tenant_id, filter, page).await
        }

        async fn save(&self, tenant_id: &str, station: &ChargingStation) -> DomainResult<()> {
            self.inner.save(tenant_id, station).await
        }

        async fn save_runtime_data(
            &self,
            tenant_id: &str,
            id: &str,
            data: &RuntimeData,
        ) -> DomainResult<()> {
            self.inner.save_runtime_data(tenant_id, id, data).await
        }
    }

    #[derive(Default)]
    struct TestRepos {
        tenants: InMemoryTenantRepository,
        stations: CountingStations,
        locks: InMemoryLockRepository,
    }

    impl RepositoryProvider for TestRepos {
        fn tenants(&self) -> &dyn TenantRepository {
            &self.tenants
        }
        fn charging_stations(&self) -> &dyn ChargingStationRepository {
            &self.stations
        }
        fn locks(&self) -> &dyn LockRepository {
            &self.locks
        }
    }

    /// Marks every station changed, except the ones told to fail.
    #[derive(Default)]
    struct ScriptedResolver {
        failing: HashSet<String>,
        panicking: HashSet<String>,
        unchanged: HashSet<String>,
        attempted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TemplateResolver for ScriptedResolver {
        async fn apply_if_needed(
            &self,
            _tenant: &Tenant,
            station: &mut ChargingStation,
        ) -> DomainResult<TemplateUpdateResult> {
            self.attempted.lock().unwrap().push(station.id.clone());
            if self.panicking.contains(&station.id) {
                panic!("resolver bug");
            }
            if self.failing.contains(&station.id) {
                return Err(DomainError::Validation("template does not fit".into()));
            }
            if self.unchanged.contains(&station.id) {
                return Ok(TemplateUpdateResult::unchanged());
            }
            station.template_hash = Some("h1".into());
            Ok(TemplateUpdateResult::updated())
        }
    }

    fn tenant() -> Tenant {
        Tenant::new("t1", "acme", "ACME")
    }

    async fn seed(repos: &TestRepos, count: usize) {
        for i in 1..=count {
            repos
                .stations
                .save("t1", &ChargingStation::new(format!("CS-{:03}", i)))
                .await
                .unwrap();
        }
    }

    fn task(
        repos: &Arc<TestRepos>,
        resolver: &Arc<ScriptedResolver>,
        page_size: u64,
    ) -> (CheckChargingStationTemplateTask, SharedLockingManager) {
        let locking = Arc::new(LockingManager::new(repos.clone(), 60));
        let task = CheckChargingStationTemplateTask::new(
            repos.clone(),
            locking.clone(),
            resolver.clone(),
        )
        .with_page_size(page_size);
        (task, locking)
    }

    fn template_lock() -> Lock {
        Lock::exclusive(
            "t1",
            LockEntity::ChargingStation,
            LockAction::CheckChargingStationTemplate,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn three_full_pages_take_four_fetches() {
        let repos = Arc::new(TestRepos::default());
        seed(&repos, 15).await;
        let resolver = Arc::new(ScriptedResolver::default());
        let (task, _) = task(&repos, &resolver, 5);

        let summary = task.run(&tenant()).await.unwrap().unwrap();

        assert_eq!(repos.stations.page_fetches.load(Ordering::SeqCst), 4);
        assert_eq!(summary.pages, 4);
        assert_eq!(summary.processed, 15);
        assert_eq!(summary.updated, 15);
        assert_eq!(resolver.attempted.lock().unwrap().len(), 15);
    }

    #[tokio::test]
    async fn one_failing_record_does_not_stop_the_page() {
        let repos = Arc::new(TestRepos::default());
        seed(&repos, 5).await;
        let resolver = Arc::new(ScriptedResolver {
            failing: HashSet::from(["CS-003".to_string()]),
            ..Default::default()
        });
        let (task, _) = task(&repos, &resolver, 10);

        let summary = task.run(&tenant()).await.unwrap().unwrap();

        assert_eq!(
            *resolver.attempted.lock().unwrap(),
            vec!["CS-001", "CS-002", "CS-003", "CS-004", "CS-005"]
        );
        assert_eq!(summary.updated, 4);
        assert_eq!(summary.failed, 1);
        let untouched = repos.stations.find_by_id("t1", "CS-003").await.unwrap().unwrap();
        assert_eq!(untouched.template_hash, None);
        let updated = repos.stations.find_by_id("t1", "CS-005").await.unwrap().unwrap();
        assert_eq!(updated.template_hash.as_deref(), Some("h1"));
    }

    #[tokio::test]
    async fn panicking_record_is_isolated_and_lock_released() {
        let repos = Arc::new(TestRepos::default());
        seed(&repos, 3).await;
        let resolver = Arc::new(ScriptedResolver {
            panicking: HashSet::from(["CS-002".to_string()]),
            ..Default::default()
        });
        let (task, locking) = task(&repos, &resolver, 10);

        let summary = task.run(&tenant()).await.unwrap().unwrap();

        assert_eq!(summary.updated, 2);
        assert_eq!(summary.failed, 1);
        assert!(locking.acquire(&template_lock()).await.unwrap());
    }

    #[tokio::test]
    async fn unchanged_records_are_not_saved_or_counted() {
        let repos = Arc::new(TestRepos::default());
        seed(&repos, 4).await;
        let resolver = Arc::new(ScriptedResolver {
            unchanged: HashSet::from(["CS-001".to_string(), "CS-004".to_string()]),
            ..Default::default()
        });
        let (task, _) = task(&repos, &resolver, 2);

        let summary = task.run(&tenant()).await.unwrap().unwrap();

        assert_eq!(summary.processed, 4);
        assert_eq!(summary.updated, 2);
        assert_eq!(summary.pages, 3);
    }

    #[tokio::test]
    async fn manual_and_foreign_stations_are_not_fetched() {
        let repos = Arc::new(TestRepos::default());
        seed(&repos, 2).await;
        let mut manual = ChargingStation::new("CS-M");
        manual.manual_configuration = true;
        let mut roaming = ChargingStation::new("CS-R");
        roaming.issuer = false;
        repos.stations.save("t1", &manual).await.unwrap();
        repos.stations.save("t1", &roaming).await.unwrap();
        let resolver = Arc::new(ScriptedResolver::default());
        let (task, _) = task(&repos, &resolver, 10);

        task.run(&tenant()).await.unwrap();

        assert_eq!(*resolver.attempted.lock().unwrap(), vec!["CS-001", "CS-002"]);
    }

    #[tokio::test]
    async fn busy_lock_skips_tenant() {
        let repos = Arc::new(TestRepos::default());
        seed(&repos, 3).await;
        let other_instance = LockingManager::new(repos.clone(), 60);
        assert!(other_instance.acquire(&template_lock()).await.unwrap());

        let resolver = Arc::new(ScriptedResolver::default());
        let (task, _) = task(&repos, &resolver, 10);

        assert_eq!(task.run(&tenant()).await.unwrap(), None);
        assert!(task.process_tenant(&tenant()).await.is_ok());
        assert!(resolver.attempted.lock().unwrap().is_empty());
        assert_eq!(repos.stations.page_fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn lock_is_released_after_run() {
        let repos = Arc::new(TestRepos::default());
        seed(&repos, 1).await;
        let resolver = Arc::new(ScriptedResolver::default());
        let (task, _) = task(&repos, &resolver, 10);

        task.run(&tenant()).await.unwrap();
        assert!(task.run(&tenant()).await.unwrap().is_some());
        assert!(repos.locks.find(&template_lock().id).await.unwrap().is_none());
    }
}
