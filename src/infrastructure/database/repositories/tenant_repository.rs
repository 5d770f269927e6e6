//! SeaORM implementation of TenantRepository

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, Set};

use super::db_err;
use crate::domain::{DomainResult, Tenant, TenantRepository};
use crate::infrastructure::database::entities::tenant;

pub struct SeaOrmTenantRepository {
    db: DatabaseConnection,
}

impl SeaOrmTenantRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn tenant_from_model(model: tenant::Model) -> Tenant {
    Tenant {
        id: model.id,
        subdomain: model.subdomain,
        name: model.name,
    }
}

#[async_trait]
impl TenantRepository for SeaOrmTenantRepository {
    async fn find_all(&self) -> DomainResult<Vec<Tenant>> {
        let models = tenant::Entity::find()
            .order_by_asc(tenant::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(tenant_from_model).collect())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Tenant>> {
        let model = tenant::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(tenant_from_model))
    }

    async fn save(&self, t: &Tenant) -> DomainResult<()> {
        let model = tenant::ActiveModel {
            id: Set(t.id.clone()),
            subdomain: Set(t.subdomain.clone()),
            name: Set(t.name.clone()),
        };
        tenant::Entity::insert(model)
            .on_conflict(
                OnConflict::column(tenant::Column::Id)
                    .update_columns([tenant::Column::Subdomain, tenant::Column::Name])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::test_connection;

    #[tokio::test]
    async fn save_is_an_upsert_and_listing_is_sorted() {
        let repo = SeaOrmTenantRepository::new(test_connection().await);
        repo.save(&Tenant::new("t2", "beta", "Beta")).await.unwrap();
        repo.save(&Tenant::new("t1", "acme", "ACME")).await.unwrap();
        repo.save(&Tenant::new("t1", "acme", "ACME Corp")).await.unwrap();

        let all = repo.find_all().await.unwrap();
        let ids: Vec<_> = all.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["t1", "t2"]);
        assert_eq!(all[0].name, "ACME Corp");
        assert!(repo.find_by_id("t3").await.unwrap().is_none());
    }
}
