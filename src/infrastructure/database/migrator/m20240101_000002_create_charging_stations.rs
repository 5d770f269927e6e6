//! Create charging_stations table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ChargingStations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ChargingStations::TenantId).string().not_null())
                    .col(ColumnDef::new(ChargingStations::Id).string().not_null())
                    .col(
                        ColumnDef::new(ChargingStations::Issuer)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ChargingStations::ManualConfiguration)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ChargingStations::SiteId).string())
                    .col(ColumnDef::new(ChargingStations::SiteAreaId).string())
                    .col(ColumnDef::new(ChargingStations::CompanyId).string())
                    .col(ColumnDef::new(ChargingStations::Vendor).string())
                    .col(ColumnDef::new(ChargingStations::Model).string())
                    .col(ColumnDef::new(ChargingStations::SerialNumber).string())
                    .col(ColumnDef::new(ChargingStations::FirmwareVersion).string())
                    .col(ColumnDef::new(ChargingStations::OcppVersion).string())
                    .col(ColumnDef::new(ChargingStations::OcppProtocol).string())
                    .col(ColumnDef::new(ChargingStations::TemplateHash).string())
                    .col(
                        ColumnDef::new(ChargingStations::OcppParameters)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .col(
                        ColumnDef::new(ChargingStations::Body)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .col(ColumnDef::new(ChargingStations::LastSeen).timestamp_with_time_zone())
                    .col(ColumnDef::new(ChargingStations::TokenId).string())
                    .col(ColumnDef::new(ChargingStations::CloudHostIp).string())
                    .col(ColumnDef::new(ChargingStations::CloudHostName).string())
                    .col(
                        ColumnDef::new(ChargingStations::CreatedOn)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChargingStations::LastChangedOn).timestamp_with_time_zone())
                    .primary_key(
                        Index::create()
                            .col(ChargingStations::TenantId)
                            .col(ChargingStations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Template batch query
        manager
            .create_index(
                Index::create()
                    .name("idx_charging_stations_template")
                    .table(ChargingStations::Table)
                    .col(ChargingStations::TenantId)
                    .col(ChargingStations::Issuer)
                    .col(ChargingStations::ManualConfiguration)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChargingStations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ChargingStations {
    Table,
    TenantId,
    Id,
    Issuer,
    ManualConfiguration,
    SiteId,
    SiteAreaId,
    CompanyId,
    Vendor,
    Model,
    SerialNumber,
    FirmwareVersion,
    OcppVersion,
    OcppProtocol,
    TemplateHash,
    OcppParameters,
    Body,
    LastSeen,
    TokenId,
    CloudHostIp,
    CloudHostName,
    CreatedOn,
    LastChangedOn,
}
