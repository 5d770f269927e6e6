//! ChargingStation entity
//!
//! One row per (tenant, station). Free-form parts of the record are kept
//! as JSON text.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "charging_stations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub tenant_id: String,

    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub issuer: bool,
    pub manual_configuration: bool,

    #[sea_orm(nullable)]
    pub site_id: Option<String>,

    #[sea_orm(nullable)]
    pub site_area_id: Option<String>,

    #[sea_orm(nullable)]
    pub company_id: Option<String>,

    #[sea_orm(nullable)]
    pub vendor: Option<String>,

    #[sea_orm(nullable)]
    pub model: Option<String>,

    #[sea_orm(nullable)]
    pub serial_number: Option<String>,

    #[sea_orm(nullable)]
    pub firmware_version: Option<String>,

    #[sea_orm(nullable)]
    pub ocpp_version: Option<String>,

    /// json / soap
    #[sea_orm(nullable)]
    pub ocpp_protocol: Option<String>,

    #[sea_orm(nullable)]
    pub template_hash: Option<String>,

    /// JSON object of configuration key -> value
    #[sea_orm(column_type = "Text")]
    pub ocpp_parameters: String,

    /// JSON object with the remaining record fields
    #[sea_orm(column_type = "Text")]
    pub body: String,

    #[sea_orm(nullable)]
    pub last_seen: Option<DateTimeUtc>,

    #[sea_orm(nullable)]
    pub token_id: Option<String>,

    #[sea_orm(nullable)]
    pub cloud_host_ip: Option<String>,

    #[sea_orm(nullable)]
    pub cloud_host_name: Option<String>,

    pub created_on: DateTimeUtc,

    #[sea_orm(nullable)]
    pub last_changed_on: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
