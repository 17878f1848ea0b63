//! Database migrations for the Workboard API.
//!
//! Two migrators live here because the service talks to two kinds of
//! databases: the shared tenant catalog, and one record partition per
//! tenant. `Migrator` owns the catalog schema; `PartitionMigrator` owns
//! the schema applied to every tenant partition when it is first opened.

pub use sea_orm_migration::prelude::*;

mod m2026_07_01_000001_create_tenants;
mod m2026_07_01_000200_create_records;

/// Migrations for the tenant catalog database.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m2026_07_01_000001_create_tenants::Migration)]
    }
}

/// Migrations applied to each per-tenant record partition.
pub struct PartitionMigrator;

#[async_trait::async_trait]
impl MigratorTrait for PartitionMigrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m2026_07_01_000200_create_records::Migration)]
    }
}
