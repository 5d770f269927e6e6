//! SeaORM implementation of ChargingStationRepository

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::{Map, Value};
use tracing::debug;

use super::db_err;
use crate::domain::charging_station::{
    ChargingStation, ChargingStationFilter, ChargingStationRepository, PageRequest, RuntimeData,
    SortField, StationLocation,
};
use crate::domain::{DomainError, DomainResult, TransportKind};
use crate::infrastructure::database::entities::charging_station::{self, Column};
use crate::shared::errors::InfraError;

pub struct SeaOrmChargingStationRepository {
    db: DatabaseConnection,
}

impl SeaOrmChargingStationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn json_err(e: serde_json::Error) -> DomainError {
    InfraError::from(e).into()
}

fn station_from_model(model: charging_station::Model) -> DomainResult<ChargingStation> {
    let ocpp_parameters: BTreeMap<String, String> =
        serde_json::from_str(&model.ocpp_parameters).map_err(json_err)?;
    let body: Map<String, Value> = serde_json::from_str(&model.body).map_err(json_err)?;
    Ok(ChargingStation {
        id: model.id,
        issuer: model.issuer,
        manual_configuration: model.manual_configuration,
        location: StationLocation {
            site_id: model.site_id,
            site_area_id: model.site_area_id,
            company_id: model.company_id,
        },
        vendor: model.vendor,
        model: model.model,
        serial_number: model.serial_number,
        firmware_version: model.firmware_version,
        ocpp_version: model.ocpp_version,
        ocpp_protocol: model.ocpp_protocol.as_deref().and_then(TransportKind::parse),
        template_hash: model.template_hash,
        ocpp_parameters,
        body,
        last_seen: model.last_seen,
        token_id: model.token_id,
        cloud_host_ip: model.cloud_host_ip,
        cloud_host_name: model.cloud_host_name,
        created_on: model.created_on,
        last_changed_on: model.last_changed_on,
    })
}

fn active_from_station(
    tenant_id: &str,
    cs: &ChargingStation,
) -> DomainResult<charging_station::ActiveModel> {
    Ok(charging_station::ActiveModel {
        tenant_id: Set(tenant_id.to_string()),
        id: Set(cs.id.clone()),
        issuer: Set(cs.issuer),
        manual_configuration: Set(cs.manual_configuration),
        site_id: Set(cs.location.site_id.clone()),
        site_area_id: Set(cs.location.site_area_id.clone()),
        company_id: Set(cs.location.company_id.clone()),
        vendor: Set(cs.vendor.clone()),
        model: Set(cs.model.clone()),
        serial_number: Set(cs.serial_number.clone()),
        firmware_version: Set(cs.firmware_version.clone()),
        ocpp_version: Set(cs.ocpp_version.clone()),
        ocpp_protocol: Set(cs.ocpp_protocol.map(|p| p.as_str().to_string())),
        template_hash: Set(cs.template_hash.clone()),
        ocpp_parameters: Set(serde_json::to_string(&cs.ocpp_parameters).map_err(json_err)?),
        body: Set(serde_json::to_string(&cs.body).map_err(json_err)?),
        last_seen: Set(cs.last_seen),
        token_id: Set(cs.token_id.clone()),
        cloud_host_ip: Set(cs.cloud_host_ip.clone()),
        cloud_host_name: Set(cs.cloud_host_name.clone()),
        created_on: Set(cs.created_on),
        last_changed_on: Set(Some(Utc::now())),
    })
}

// ── ChargingStationRepository impl ──────────────────────────────

#[async_trait]
impl ChargingStationRepository for SeaOrmChargingStationRepository {
    async fn find_by_id(&self, tenant_id: &str, id: &str) -> DomainResult<Option<ChargingStation>> {
        charging_station::Entity::find_by_id((tenant_id.to_string(), id.to_string()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(station_from_model)
            .transpose()
    }

    async fn find_page(
        &self,
        tenant_id: &str,
        filter: &ChargingStationFilter,
        page: &PageRequest,
    ) -> DomainResult<Vec<ChargingStation>> {
        let mut query = charging_station::Entity::find().filter(Column::TenantId.eq(tenant_id));
        if let Some(issuer) = filter.issuer {
            query = query.filter(Column::Issuer.eq(issuer));
        }
        if let Some(manual) = filter.manual_configuration {
            query = query.filter(Column::ManualConfiguration.eq(manual));
        }

        query = match page.sort {
            Some(sort) => {
                let order = || if sort.descending { Order::Desc } else { Order::Asc };
                match sort.field {
                    SortField::Id => query.order_by(Column::Id, order()),
                    SortField::LastSeen => query
                        .order_by(Column::LastSeen, order())
                        .order_by(Column::Id, order()),
                }
            }
            // Natural order is by id
            None => query.order_by_asc(Column::Id),
        };

        let models = query
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(station_from_model).collect()
    }

    async fn save(&self, tenant_id: &str, station: &ChargingStation) -> DomainResult<()> {
        debug!(tenant_id, charging_station_id = %station.id, "Saving charging station");
        let model = active_from_station(tenant_id, station)?;
        charging_station::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([Column::TenantId, Column::Id])
                    .update_columns([
                        Column::Issuer,
                        Column::ManualConfiguration,
                        Column::SiteId,
                        Column::SiteAreaId,
                        Column::CompanyId,
                        Column::Vendor,
                        Column::Model,
                        Column::SerialNumber,
                        Column::FirmwareVersion,
                        Column::OcppVersion,
                        Column::OcppProtocol,
                        Column::TemplateHash,
                        Column::OcppParameters,
                        Column::Body,
                        Column::LastSeen,
                        Column::TokenId,
                        Column::CloudHostIp,
                        Column::CloudHostName,
                        Column::LastChangedOn,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn save_runtime_data(
        &self,
        tenant_id: &str,
        id: &str,
        data: &RuntimeData,
    ) -> DomainResult<()> {
        let result = charging_station::Entity::update_many()
            .col_expr(Column::LastSeen, Expr::value(data.last_seen))
            .col_expr(Column::TokenId, Expr::value(data.token_id.clone()))
            .col_expr(Column::CloudHostIp, Expr::value(data.cloud_host_ip.clone()))
            .col_expr(Column::CloudHostName, Expr::value(data.cloud_host_name.clone()))
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            debug!(tenant_id, charging_station_id = id, "No record for runtime data update");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::charging_station::Sort;
    use crate::infrastructure::database::test_connection;

    fn station(id: &str) -> ChargingStation {
        let mut cs = ChargingStation::new(id);
        cs.vendor = Some("ACME".into());
        cs.ocpp_protocol = Some(TransportKind::Json);
        cs.ocpp_parameters.insert("HeartbeatInterval".into(), "60".into());
        cs.set_connector_status(1, "Available", "NoError");
        cs
    }

    #[tokio::test]
    async fn save_and_reload_keeps_json_fields() {
        let repo = SeaOrmChargingStationRepository::new(test_connection().await);
        let mut cs = station("CS-1");
        cs.location.site_area_id = Some("area-1".into());
        repo.save("t1", &cs).await.unwrap();

        let loaded = repo.find_by_id("t1", "CS-1").await.unwrap().unwrap();
        assert_eq!(loaded.vendor.as_deref(), Some("ACME"));
        assert_eq!(loaded.ocpp_protocol, Some(TransportKind::Json));
        assert_eq!(loaded.ocpp_parameters.get("HeartbeatInterval").map(String::as_str), Some("60"));
        assert_eq!(loaded.connector_status(1), Some("Available"));
        assert!(loaded.location.is_resolved());
        assert!(loaded.last_changed_on.is_some());
        assert!(repo.find_by_id("t2", "CS-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_replaces_existing_record() {
        let repo = SeaOrmChargingStationRepository::new(test_connection().await);
        let mut cs = station("CS-1");
        repo.save("t1", &cs).await.unwrap();
        cs.template_hash = Some("abc".into());
        cs.manual_configuration = true;
        repo.save("t1", &cs).await.unwrap();

        let loaded = repo.find_by_id("t1", "CS-1").await.unwrap().unwrap();
        assert_eq!(loaded.template_hash.as_deref(), Some("abc"));
        assert!(loaded.manual_configuration);
    }

    #[tokio::test]
    async fn pages_are_filtered_and_tenant_scoped() {
        let repo = SeaOrmChargingStationRepository::new(test_connection().await);
        for id in ["CS-3", "CS-1", "CS-2", "CS-4"] {
            repo.save("t1", &station(id)).await.unwrap();
        }
        let mut manual = station("CS-0");
        manual.manual_configuration = true;
        repo.save("t1", &manual).await.unwrap();
        repo.save("t2", &station("CS-9")).await.unwrap();

        let filter = ChargingStationFilter::template_eligible();
        let first = repo.find_page("t1", &filter, &PageRequest::first(3)).await.unwrap();
        let ids: Vec<_> = first.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["CS-1", "CS-2", "CS-3"]);

        let second = repo
            .find_page("t1", &filter, &PageRequest::first(3).next())
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, "CS-4");

        let sorted = repo
            .find_page(
                "t1",
                &ChargingStationFilter::default(),
                &PageRequest {
                    limit: 10,
                    skip: 0,
                    sort: Some(Sort {
                        field: SortField::Id,
                        descending: true,
                    }),
                },
            )
            .await
            .unwrap();
        assert_eq!(sorted.first().map(|c| c.id.as_str()), Some("CS-4"));
        assert_eq!(sorted.len(), 5);
    }

    #[tokio::test]
    async fn runtime_update_touches_runtime_fields_only() {
        let repo = SeaOrmChargingStationRepository::new(test_connection().await);
        repo.save("t1", &station("CS-1")).await.unwrap();

        let now = Utc::now();
        let data = RuntimeData {
            last_seen: now,
            token_id: Some("tok".into()),
            cloud_host_ip: Some("10.0.0.1".into()),
            cloud_host_name: Some("gw-1".into()),
        };
        repo.save_runtime_data("t1", "CS-1", &data).await.unwrap();
        // Missing record is a no-op
        repo.save_runtime_data("t1", "CS-404", &data).await.unwrap();

        let loaded = repo.find_by_id("t1", "CS-1").await.unwrap().unwrap();
        assert_eq!(loaded.token_id.as_deref(), Some("tok"));
        assert_eq!(loaded.cloud_host_name.as_deref(), Some("gw-1"));
        assert!(loaded.last_seen.is_some());
        assert_eq!(loaded.vendor.as_deref(), Some("ACME"));
        assert!(repo.find_by_id("t1", "CS-404").await.unwrap().is_none());
    }
}
