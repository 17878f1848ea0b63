//! # Document Storage
//!
//! Partition-per-tenant document stores. A [`DocumentStore`] hands out
//! [`Partition`]s; each partition holds the collections of exactly one
//! tenant, so queries cannot cross tenants by construction.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{Document, Filter, Patch, RecordId, TenantId};

pub mod memory;
pub mod sql;

pub use memory::MemoryStore;
pub use sql::SqlStore;

/// Errors raised by the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open partition for tenant '{tenant}': {source}")]
    OpenPartition {
        tenant: String,
        #[source]
        source: sea_orm::DbErr,
    },
    #[error("failed to migrate partition for tenant '{tenant}': {source}")]
    MigratePartition {
        tenant: String,
        #[source]
        source: sea_orm::DbErr,
    },
    #[error("storage operation failed: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("record '{id}' holds a malformed document: {message}")]
    MalformedDocument { id: String, message: String },
}

/// Opens per-tenant partitions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Open the partition backing a tenant, creating it on first use.
    async fn partition(&self, tenant: &TenantId) -> Result<Arc<dyn Partition>, StorageError>;
}

/// Collection-level document operations inside one tenant's partition.
///
/// `find_one`, `update_one` and `delete_one` act on the oldest matching
/// document when the filter matches several.
#[async_trait]
pub trait Partition: Send + Sync {
    async fn insert(
        &self,
        collection: &str,
        id: RecordId,
        fields: Map<String, Value>,
    ) -> Result<Document, StorageError>;

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StorageError>;

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<Document>, StorageError>;

    /// Patch the first matching document. Returns the number patched (0 or 1).
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<u64, StorageError>;

    /// Patch every matching document. Returns the number patched.
    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<u64, StorageError>;

    /// Delete the first matching document. Returns the number deleted (0 or 1).
    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, StorageError>;
}
