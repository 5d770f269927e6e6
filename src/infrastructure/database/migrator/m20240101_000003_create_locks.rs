//! Create locks table
//!
//! The primary key on `id` is what makes lock acquisition atomic across
//! gateway instances.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Locks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Locks::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Locks::TenantId).string().not_null())
                    .col(ColumnDef::new(Locks::Entity).string().not_null())
                    .col(ColumnDef::new(Locks::Action).string().not_null())
                    .col(ColumnDef::new(Locks::LockType).string().not_null().default("E"))
                    .col(ColumnDef::new(Locks::Holder).string().not_null())
                    .col(ColumnDef::new(Locks::HostName).string().not_null())
                    .col(
                        ColumnDef::new(Locks::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Locks::ExpirationDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Locks::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Locks {
    Table,
    Id,
    TenantId,
    Entity,
    Action,
    LockType,
    Holder,
    HostName,
    Timestamp,
    ExpirationDate,
}
