//! # Model Registry
//!
//! Hands out per-tenant, per-kind accessors over the partitions and
//! tracks the schema extensions registered at runtime. Extensions are
//! process-local: they shape inserts made through this registry and are
//! backfilled onto stored records when registered.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use metrics::counter;
use serde_json::{Map, Value};

use super::registry::PartitionRegistry;
use crate::domain::{Document, EntityKind, FieldType, FieldValue, Filter, Patch, RecordId, TenantId};
use crate::error::CoreError;
use crate::storage::Partition;

/// A runtime-registered field on one tenant's records of one kind.
///
/// The default is captured once at registration and stamped onto every
/// insert that omits the field.
#[derive(Debug, Clone)]
pub struct FieldExtension {
    pub name: String,
    pub field_type: FieldType,
    pub default: FieldValue,
}

/// Registry of per-tenant model accessors and their schema extensions.
pub struct ModelRegistry {
    partitions: Arc<PartitionRegistry>,
    extensions: Mutex<HashMap<(TenantId, EntityKind), Vec<FieldExtension>>>,
}

impl ModelRegistry {
    pub fn new(partitions: Arc<PartitionRegistry>) -> Self {
        Self {
            partitions,
            extensions: Mutex::new(HashMap::new()),
        }
    }

    /// Accessor for one tenant's records of the given kind.
    ///
    /// The accessor snapshots the extensions registered so far; it is
    /// meant to live for a single request.
    pub async fn resolve(
        &self,
        tenant: &TenantId,
        kind: EntityKind,
    ) -> Result<ModelAccessor, CoreError> {
        let partition = self.partitions.partition(tenant).await?;
        Ok(ModelAccessor {
            tenant: tenant.clone(),
            kind,
            partition,
            extensions: self.extensions_for(tenant, kind),
        })
    }

    /// Register a schema extension and backfill existing records.
    ///
    /// The field name must not shadow the base schema, the type must be
    /// one of the supported set, and a provided default must conform to
    /// it. Returns the number of records the default was stamped onto.
    pub async fn add_field(
        &self,
        tenant: &TenantId,
        kind: EntityKind,
        name: &str,
        field_type: &str,
        default: Option<&Value>,
    ) -> Result<u64, CoreError> {
        let field_type = field_type.parse::<FieldType>()?;
        if name.is_empty() {
            return Err(CoreError::invalid_identifier("field name must not be empty"));
        }
        if kind.base_fields().contains(&name) {
            return Err(CoreError::ReservedField {
                name: name.to_string(),
                kind: kind.display_name(),
            });
        }
        let default = match default {
            Some(value) => FieldValue::from_json(field_type, value)?,
            None => FieldValue::default_for(field_type),
        };

        // Register first so concurrent inserts pick the field up, then
        // stamp the default onto everything already stored.
        {
            let mut extensions = self
                .extensions
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let entry = extensions.entry((tenant.clone(), kind)).or_default();
            entry.retain(|extension| extension.name != name);
            entry.push(FieldExtension {
                name: name.to_string(),
                field_type,
                default: default.clone(),
            });
        }

        let partition = self.partitions.partition(tenant).await?;
        let patch = Patch::new().set(name, default.to_json());
        let updated = partition
            .update_many(kind.collection(), &Filter::all(), &patch)
            .await?;

        let metric_labels = vec![("tenant_id", tenant.as_str().to_string())];
        counter!("schema_extensions_total", &metric_labels).increment(1);
        tracing::info!(
            tenant_id = %tenant,
            kind = %kind,
            field = name,
            field_type = %field_type,
            records_updated = updated,
            "Registered schema extension"
        );

        Ok(updated)
    }

    /// Extensions registered for one tenant and kind.
    pub fn extensions_for(&self, tenant: &TenantId, kind: EntityKind) -> Vec<FieldExtension> {
        let extensions = self
            .extensions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        extensions
            .get(&(tenant.clone(), kind))
            .cloned()
            .unwrap_or_default()
    }
}

/// Gateway to one tenant's records of a single kind.
pub struct ModelAccessor {
    tenant: TenantId,
    kind: EntityKind,
    partition: Arc<dyn Partition>,
    extensions: Vec<FieldExtension>,
}

impl ModelAccessor {
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Insert a record, stamping extension defaults for absent fields.
    pub async fn insert(&self, mut fields: Map<String, Value>) -> Result<Document, CoreError> {
        for extension in &self.extensions {
            fields
                .entry(extension.name.clone())
                .or_insert_with(|| extension.default.to_json());
        }
        let id = RecordId::generate();
        let document = self
            .partition
            .insert(self.kind.collection(), id, fields)
            .await?;
        tracing::debug!(
            tenant_id = %self.tenant,
            kind = %self.kind,
            record_id = %id,
            "Inserted record"
        );
        Ok(document)
    }

    pub async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, CoreError> {
        Ok(self
            .partition
            .find_one(self.kind.collection(), filter)
            .await?)
    }

    pub async fn find_many(&self, filter: &Filter) -> Result<Vec<Document>, CoreError> {
        Ok(self
            .partition
            .find_many(self.kind.collection(), filter)
            .await?)
    }

    pub async fn update_one(&self, filter: &Filter, patch: &Patch) -> Result<u64, CoreError> {
        Ok(self
            .partition
            .update_one(self.kind.collection(), filter, patch)
            .await?)
    }

    pub async fn update_many(&self, filter: &Filter, patch: &Patch) -> Result<u64, CoreError> {
        Ok(self
            .partition
            .update_many(self.kind.collection(), filter, patch)
            .await?)
    }

    pub async fn delete_one(&self, filter: &Filter) -> Result<u64, CoreError> {
        Ok(self
            .partition
            .delete_one(self.kind.collection(), filter)
            .await?)
    }
}
