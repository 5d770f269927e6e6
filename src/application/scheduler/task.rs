//! Tenant scheduler
//!
//! On every tick, loads all tenants and runs each registered task for each
//! tenant. Tenants are processed concurrently; a task serializes itself
//! across instances with the locking manager.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use futures_util::FutureExt;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::domain::{DomainError, LockError, RepositoryProvider, Tenant};
use crate::shared::shutdown::ShutdownSignal;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[async_trait]
pub trait TenantSchedulerTask: Send + Sync {
    fn name(&self) -> &'static str;

    async fn process_tenant(&self, tenant: &Tenant) -> Result<(), TaskError>;
}

pub struct TenantScheduler {
    repos: Arc<dyn RepositoryProvider>,
    tasks: Vec<Arc<dyn TenantSchedulerTask>>,
}

impl TenantScheduler {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self {
            repos,
            tasks: Vec::new(),
        }
    }

    pub fn with_task(mut self, task: Arc<dyn TenantSchedulerTask>) -> Self {
        self.tasks.push(task);
        self
    }

    /// Run every task once for every tenant.
    pub async fn run_once(&self) -> Result<(), DomainError> {
        let tenants = self.repos.tenants().find_all().await?;
        debug!(tenants = tenants.len(), tasks = self.tasks.len(), "Scheduler tick");

        for task in &self.tasks {
            // A panicking tenant run must not take the tick loop down
            let runs = tenants.iter().map(|tenant| async move {
                match AssertUnwindSafe(task.process_tenant(tenant)).catch_unwind().await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => error!(
                        task = task.name(),
                        tenant_id = tenant.id.as_str(),
                        tenant = %tenant,
                        error = %e,
                        "Scheduled task failed for tenant"
                    ),
                    Err(_) => error!(
                        task = task.name(),
                        tenant_id = tenant.id.as_str(),
                        tenant = %tenant,
                        "Scheduled task panicked for tenant"
                    ),
                }
            });
            join_all(runs).await;
        }
        Ok(())
    }

    /// Spawn the tick loop. Stops on shutdown.
    pub fn start(self: Arc<Self>, interval_secs: u64, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(async move {
            let names: Vec<&str> = self.tasks.iter().map(|t| t.name()).collect();
            info!(
                interval = interval_secs,
                tasks = ?names,
                "⏰ Tenant scheduler started"
            );

            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.run_once().await {
                            error!(error = %e, "Scheduler tick failed");
                        }
                    }
                    _ = shutdown.notified().wait() => {
                        info!("⏰ Tenant scheduler shutting down");
                        break;
                    }
                }
            }

            info!("⏰ Tenant scheduler stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TenantSchedulerTask for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn process_tenant(&self, tenant: &Tenant) -> Result<(), TaskError> {
            self.seen.lock().unwrap().push(tenant.id.clone());
            if tenant.id == "bad" {
                return Err(DomainError::Validation("broken tenant".into()).into());
            }
            if tenant.id == "boom" {
                panic!("tenant run exploded");
            }
            Ok(())
        }
    }

    async fn repos_with(ids: &[&str]) -> Arc<InMemoryRepositoryProvider> {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        for id in ids {
            repos
                .tenants()
                .save(&Tenant::new(*id, *id, *id))
                .await
                .unwrap();
        }
        repos
    }

    #[tokio::test]
    async fn every_tenant_is_processed_despite_failures() {
        let repos = repos_with(&["a", "bad", "c"]).await;
        let task = Arc::new(Recording::default());
        let scheduler = TenantScheduler::new(repos).with_task(task.clone());

        scheduler.run_once().await.unwrap();

        let mut seen = task.seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec!["a", "bad", "c"]);
    }

    #[tokio::test]
    async fn panicking_tenant_does_not_stop_the_others() {
        let repos = repos_with(&["a", "boom", "c"]).await;
        let task = Arc::new(Recording::default());
        let scheduler = TenantScheduler::new(repos).with_task(task.clone());

        scheduler.run_once().await.unwrap();
        // Still usable on the next tick
        scheduler.run_once().await.unwrap();

        let seen = task.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 6);
        assert_eq!(seen.iter().filter(|id| *id == "c").count(), 2);
    }

    #[tokio::test]
    async fn loop_ticks_until_shutdown() {
        let repos = repos_with(&["a"]).await;
        let task = Arc::new(Recording::default());
        let scheduler = Arc::new(TenantScheduler::new(repos).with_task(task.clone()));
        let shutdown = ShutdownSignal::new();

        let handle = scheduler.start(1, shutdown.clone());
        // The first tick fires immediately
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.trigger();
        handle.await.unwrap();

        assert!(!task.seen.lock().unwrap().is_empty());
    }
}
