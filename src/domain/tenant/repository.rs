//! Tenant repository interface

use async_trait::async_trait;

use super::model::Tenant;
use crate::domain::DomainResult;

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn find_all(&self) -> DomainResult<Vec<Tenant>>;
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Tenant>>;
    async fn save(&self, tenant: &Tenant) -> DomainResult<()>;
}
