//! SQL-backed partition store.
//!
//! Each tenant gets its own database, derived from a connection URL
//! template with a `{tenant}` placeholder. Opening a partition connects,
//! brings the schema up to date, and hands back a [`Partition`] over the
//! records table.
//!
//! Opens are single attempts. Callers that want open-once semantics per
//! tenant go through the partition registry, which also keeps failed
//! opens out of the cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use migration::PartitionMigrator;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use sea_orm_migration::MigratorTrait;
use serde_json::{Map, Value};

use super::{DocumentStore, Partition, StorageError};
use crate::config::AppConfig;
use crate::domain::{Document, Filter, Patch, RecordId, TenantId};
use crate::models::record::{self, Entity as Records};

/// Placeholder substituted with the tenant id when deriving partition URLs.
pub const TENANT_PLACEHOLDER: &str = "{tenant}";

/// Opens one database per tenant from a URL template.
pub struct SqlStore {
    url_template: String,
    max_connections: u32,
    acquire_timeout: Duration,
}

impl SqlStore {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            url_template: cfg.partition_url_template.clone(),
            max_connections: cfg.db_max_connections,
            acquire_timeout: Duration::from_millis(cfg.db_acquire_timeout_ms),
        }
    }

    /// Connection URL for a tenant's partition database.
    fn partition_url(&self, tenant: &TenantId) -> String {
        self.url_template
            .replace(TENANT_PLACEHOLDER, tenant.as_str())
    }
}

#[async_trait]
impl DocumentStore for SqlStore {
    async fn partition(&self, tenant: &TenantId) -> Result<Arc<dyn Partition>, StorageError> {
        let open_start = Instant::now();

        let mut opt = ConnectOptions::new(self.partition_url(tenant));
        opt.max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(Duration::from_secs(600)) // 10 minutes
            .max_lifetime(Duration::from_secs(1800)) // 30 minutes
            .sqlx_logging(true)
            .sqlx_logging_level(log::LevelFilter::Debug);

        let connection =
            Database::connect(opt)
                .await
                .map_err(|source| StorageError::OpenPartition {
                    tenant: tenant.as_str().to_string(),
                    source,
                })?;

        PartitionMigrator::up(&connection, None).await.map_err(|source| {
            StorageError::MigratePartition {
                tenant: tenant.as_str().to_string(),
                source,
            }
        })?;

        histogram!("partition_open_duration_ms")
            .record(open_start.elapsed().as_secs_f64() * 1_000.0);
        let metric_labels = vec![("tenant_id", tenant.as_str().to_string())];
        counter!("partitions_opened_total", &metric_labels).increment(1);
        tracing::info!(tenant_id = %tenant, "Opened tenant partition");

        Ok(Arc::new(SqlPartition { connection }))
    }
}

/// Document operations over one partition database.
struct SqlPartition {
    connection: DatabaseConnection,
}

impl SqlPartition {
    /// Load documents of one kind matching the filter, oldest first.
    ///
    /// Only the id condition is pushed down to SQL; field equality is
    /// evaluated on the decoded documents.
    async fn load(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StorageError> {
        let mut query = Records::find().filter(record::Column::Kind.eq(collection));
        if let Some(id) = filter.id() {
            query = query.filter(record::Column::Id.eq(id.as_uuid()));
        }
        let rows = query
            .order_by_asc(record::Column::CreatedAt)
            .all(&self.connection)
            .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let document = decode_row(row)?;
            if filter.matches(&document) {
                documents.push(document);
            }
        }
        Ok(documents)
    }

    /// Write back a patched document.
    ///
    /// The read-modify-write is not atomic; concurrent patches to the same
    /// record can interleave, last write wins per field map.
    async fn save(&self, document: Document) -> Result<(), StorageError> {
        let model = record::ActiveModel {
            id: Set(document.id.as_uuid()),
            doc: Set(Value::Object(document.fields)),
            updated_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };
        Records::update(model).exec(&self.connection).await?;
        Ok(())
    }
}

#[async_trait]
impl Partition for SqlPartition {
    async fn insert(
        &self,
        collection: &str,
        id: RecordId,
        fields: Map<String, Value>,
    ) -> Result<Document, StorageError> {
        let now = chrono::Utc::now();
        let model = record::ActiveModel {
            id: Set(id.as_uuid()),
            kind: Set(collection.to_string()),
            doc: Set(Value::Object(fields.clone())),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        model.insert(&self.connection).await?;
        Ok(Document::new(id, fields))
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StorageError> {
        Ok(self.load(collection, filter).await?.into_iter().next())
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<Document>, StorageError> {
        self.load(collection, filter).await
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<u64, StorageError> {
        let Some(mut document) = self.load(collection, filter).await?.into_iter().next() else {
            return Ok(0);
        };
        patch.apply(&mut document.fields);
        self.save(document).await?;
        Ok(1)
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<u64, StorageError> {
        let documents = self.load(collection, filter).await?;
        let patched = documents.len() as u64;
        for mut document in documents {
            patch.apply(&mut document.fields);
            self.save(document).await?;
        }
        Ok(patched)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, StorageError> {
        let Some(document) = self.load(collection, filter).await?.into_iter().next() else {
            return Ok(0);
        };
        let result = Records::delete_by_id(document.id.as_uuid())
            .exec(&self.connection)
            .await?;
        Ok(result.rows_affected)
    }
}

fn decode_row(row: record::Model) -> Result<Document, StorageError> {
    let Value::Object(fields) = row.doc else {
        return Err(StorageError::MalformedDocument {
            id: row.id.to_string(),
            message: "doc column is not a JSON object".to_string(),
        });
    };
    Ok(Document::new(RecordId::from_uuid(row.id), fields))
}
