//! SeaORM implementation of LockRepository
//!
//! Acquisition relies on the primary key: the insert either creates the row
//! or does nothing, in one statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use tracing::warn;

use super::db_err;
use crate::domain::locking::{Lock, LockAction, LockEntity, LockRecord, LockRepository, LockType};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::lock;

pub struct SeaOrmLockRepository {
    db: DatabaseConnection,
}

impl SeaOrmLockRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn record_from_model(model: lock::Model) -> DomainResult<LockRecord> {
    let entity = LockEntity::parse(&model.entity).ok_or_else(|| {
        DomainError::Validation(format!("unknown lock entity '{}'", model.entity))
    })?;
    let action = LockAction::parse(&model.action).ok_or_else(|| {
        DomainError::Validation(format!("unknown lock action '{}'", model.action))
    })?;
    if model.lock_type != LockType::Exclusive.as_str() {
        warn!(lock_id = %model.id, lock_type = %model.lock_type, "Unexpected lock type");
    }
    Ok(LockRecord {
        lock: Lock {
            id: model.id,
            tenant_id: model.tenant_id,
            entity,
            action,
            lock_type: LockType::Exclusive,
        },
        holder: model.holder,
        host_name: model.host_name,
        timestamp: model.timestamp,
        expiration_date: model.expiration_date,
    })
}

#[async_trait]
impl LockRepository for SeaOrmLockRepository {
    async fn insert_if_absent(&self, record: &LockRecord) -> DomainResult<bool> {
        let model = lock::ActiveModel {
            id: Set(record.lock.id.clone()),
            tenant_id: Set(record.lock.tenant_id.clone()),
            entity: Set(record.lock.entity.as_str().to_string()),
            action: Set(record.lock.action.as_str().to_string()),
            lock_type: Set(record.lock.lock_type.as_str().to_string()),
            holder: Set(record.holder.clone()),
            host_name: Set(record.host_name.clone()),
            timestamp: Set(record.timestamp),
            expiration_date: Set(record.expiration_date),
        };
        let inserted = lock::Entity::insert(model)
            .on_conflict(
                OnConflict::column(lock::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await;
        match inserted {
            Ok(rows) => Ok(rows == 1),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn delete_expired(&self, lock_id: &str, now: DateTime<Utc>) -> DomainResult<bool> {
        let result = lock::Entity::delete_many()
            .filter(lock::Column::Id.eq(lock_id))
            .filter(lock::Column::ExpirationDate.lte(now))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_held(&self, lock_id: &str, holder: &str) -> DomainResult<bool> {
        let result = lock::Entity::delete_many()
            .filter(lock::Column::Id.eq(lock_id))
            .filter(lock::Column::Holder.eq(holder))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn find(&self, lock_id: &str) -> DomainResult<Option<LockRecord>> {
        lock::Entity::find_by_id(lock_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(record_from_model)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::infrastructure::database::test_connection;

    fn record(holder: &str, expires_in: Duration) -> LockRecord {
        let now = Utc::now();
        LockRecord {
            lock: Lock::exclusive(
                "t1",
                LockEntity::ChargingStation,
                LockAction::CheckChargingStationTemplate,
            )
            .unwrap(),
            holder: holder.to_string(),
            host_name: "test-host".to_string(),
            timestamp: now,
            expiration_date: now + expires_in,
        }
    }

    #[tokio::test]
    async fn second_insert_is_refused() {
        let repo = SeaOrmLockRepository::new(test_connection().await);
        assert!(repo.insert_if_absent(&record("a", Duration::minutes(3))).await.unwrap());
        assert!(!repo.insert_if_absent(&record("b", Duration::minutes(3))).await.unwrap());

        let stored = repo.find(&record("a", Duration::zero()).lock.id).await.unwrap().unwrap();
        assert_eq!(stored.holder, "a");
        assert_eq!(stored.lock.action, LockAction::CheckChargingStationTemplate);
    }

    #[tokio::test]
    async fn concurrent_inserts_have_one_winner() {
        let repo = Arc::new(SeaOrmLockRepository::new(test_connection().await));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.insert_if_absent(&record(&format!("h{i}"), Duration::minutes(3)))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn delete_held_checks_holder() {
        let repo = SeaOrmLockRepository::new(test_connection().await);
        let rec = record("a", Duration::minutes(3));
        repo.insert_if_absent(&rec).await.unwrap();

        assert!(!repo.delete_held(&rec.lock.id, "b").await.unwrap());
        assert!(repo.delete_held(&rec.lock.id, "a").await.unwrap());
        assert!(repo.find(&rec.lock.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_expired_leaves_live_locks() {
        let repo = SeaOrmLockRepository::new(test_connection().await);
        let live = record("a", Duration::minutes(3));
        repo.insert_if_absent(&live).await.unwrap();
        assert!(!repo.delete_expired(&live.lock.id, Utc::now()).await.unwrap());

        repo.delete_held(&live.lock.id, "a").await.unwrap();
        let stale = record("a", Duration::seconds(-10));
        repo.insert_if_absent(&stale).await.unwrap();
        assert!(repo.delete_expired(&stale.lock.id, Utc::now()).await.unwrap());
        assert!(repo.insert_if_absent(&record("b", Duration::minutes(3))).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_action_in_stored_row_is_rejected() {
        let db = test_connection().await;
        let now = Utc::now();
        lock::Entity::insert(lock::ActiveModel {
            id: Set("bogus".to_string()),
            tenant_id: Set("t1".to_string()),
            entity: Set(LockEntity::ChargingStation.as_str().to_string()),
            action: Set("RebootEverything".to_string()),
            lock_type: Set(LockType::Exclusive.as_str().to_string()),
            holder: Set("a".to_string()),
            host_name: Set("test-host".to_string()),
            timestamp: Set(now),
            expiration_date: Set(now + Duration::minutes(3)),
        })
        .exec_without_returning(&db)
        .await
        .unwrap();

        let repo = SeaOrmLockRepository::new(db);
        let err = repo.find("bogus").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
