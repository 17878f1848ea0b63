//! Record entity model
//!
//! SeaORM entity for the records table that every partition database
//! carries. Documents are stored whole in the doc column; kind groups
//! them into collections.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// A stored document row
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "records")]
pub struct Model {
    /// Record identifier (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Collection the record belongs to (employees, tasks, kpis)
    pub kind: String,

    /// The document fields as stored
    #[sea_orm(column_type = "JsonBinary")]
    pub doc: Json,

    /// Timestamp when the record was inserted
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp of the last patch
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
