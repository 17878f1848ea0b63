//! # Tenant Catalog
//!
//! Repository over the tenants table in the control database. Rows here
//! are the source of truth for which tenant identifiers are allowed
//! through the API.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set,
};

use crate::domain::TenantId;
use crate::models::tenant::{
    ActiveModel as TenantActiveModel, Column as TenantColumn, Entity as Tenant,
    Model as TenantModel,
};

/// Repository for tenant catalog operations
pub struct TenantCatalog<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TenantCatalog<'a> {
    /// Create a new TenantCatalog with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a tenant. Fails on duplicate ids with a unique violation.
    pub async fn create(
        &self,
        id: &TenantId,
        display_name: Option<String>,
    ) -> Result<TenantModel, DbErr> {
        let tenant = TenantActiveModel {
            id: Set(id.as_str().to_string()),
            display_name: Set(display_name),
            created_at: Set(Utc::now().into()),
        };

        tenant.insert(self.db).await
    }

    /// Get a tenant by id
    pub async fn get(&self, id: &TenantId) -> Result<Option<TenantModel>, DbErr> {
        Tenant::find_by_id(id.as_str()).one(self.db).await
    }

    /// List all tenants, oldest first
    pub async fn list(&self) -> Result<Vec<TenantModel>, DbErr> {
        Tenant::find()
            .order_by_asc(TenantColumn::CreatedAt)
            .all(self.db)
            .await
    }

    /// Check whether a tenant is registered
    pub async fn exists(&self, id: &TenantId) -> Result<bool, DbErr> {
        Ok(self.get(id).await?.is_some())
    }
}
