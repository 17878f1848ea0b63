//! In-memory store used by tests and the `memory` storage backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{DocumentStore, Partition, StorageError};
use crate::domain::{Document, Filter, Patch, RecordId, TenantId};

/// Keeps every partition in process memory.
#[derive(Default)]
pub struct MemoryStore {
    partitions: Mutex<HashMap<String, Arc<MemoryPartition>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn partition(&self, tenant: &TenantId) -> Result<Arc<dyn Partition>, StorageError> {
        let mut partitions = self
            .partitions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let partition = partitions
            .entry(tenant.as_str().to_string())
            .or_insert_with(|| Arc::new(MemoryPartition::default()));
        Ok(Arc::clone(partition) as Arc<dyn Partition>)
    }
}

/// One tenant's collections, each a list of documents in insertion order.
#[derive(Default)]
struct MemoryPartition {
    collections: Mutex<HashMap<String, Vec<Document>>>,
}

impl MemoryPartition {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Document>>> {
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Partition for MemoryPartition {
    async fn insert(
        &self,
        collection: &str,
        id: RecordId,
        fields: Map<String, Value>,
    ) -> Result<Document, StorageError> {
        let doc = Document::new(id, fields);
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StorageError> {
        let collections = self.lock();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)).cloned()))
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<Document>, StorageError> {
        let collections = self.lock();
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<u64, StorageError> {
        let mut collections = self.lock();
        if let Some(docs) = collections.get_mut(collection)
            && let Some(doc) = docs.iter_mut().find(|doc| filter.matches(doc))
        {
            patch.apply(&mut doc.fields);
            return Ok(1);
        }
        Ok(0)
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<u64, StorageError> {
        let mut collections = self.lock();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let mut patched = 0;
        for doc in docs.iter_mut().filter(|doc| filter.matches(doc)) {
            patch.apply(&mut doc.fields);
            patched += 1;
        }
        Ok(patched)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, StorageError> {
        let mut collections = self.lock();
        if let Some(docs) = collections.get_mut(collection)
            && let Some(index) = docs.iter().position(|doc| filter.matches(doc))
        {
            docs.remove(index);
            return Ok(1);
        }
        Ok(0)
    }
}
