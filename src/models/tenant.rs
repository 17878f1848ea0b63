//! Tenant catalog entity model
//!
//! SeaORM entity for the tenants table in the control database. The row
//! id is the tenant slug that gets substituted into partition URLs.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// A registered tenant
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    /// Tenant slug (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Display name for the tenant (optional)
    pub display_name: Option<String>,

    /// Timestamp when the tenant was registered
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
