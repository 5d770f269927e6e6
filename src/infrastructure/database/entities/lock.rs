//! Lock entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "locks")]
pub struct Model {
    /// sha256 of tenant~entity~action
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub tenant_id: String,
    pub entity: String,
    pub action: String,

    /// E (exclusive)
    pub lock_type: String,

    pub holder: String,
    pub host_name: String,
    pub timestamp: DateTimeUtc,
    pub expiration_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
