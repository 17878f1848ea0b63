//! # Partition Registry
//!
//! Opens each tenant's partition at most once per process and caches the
//! handle. Concurrent first requests for the same tenant share a single
//! open; failed opens are not cached, so a tenant whose storage was
//! unreachable can recover on a later request.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;

use crate::domain::TenantId;
use crate::error::CoreError;
use crate::storage::{DocumentStore, Partition};

type PartitionCell = Arc<OnceCell<Arc<dyn Partition>>>;

/// Per-tenant partition cache over a [`DocumentStore`].
pub struct PartitionRegistry {
    store: Arc<dyn DocumentStore>,
    cells: Mutex<HashMap<TenantId, PartitionCell>>,
}

impl PartitionRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// The partition for a tenant, opening it on first use.
    pub async fn partition(&self, tenant: &TenantId) -> Result<Arc<dyn Partition>, CoreError> {
        // The cell map lock guards only the lookup; the open itself runs
        // outside it, serialized per tenant by the cell.
        let cell = {
            let mut cells = self
                .cells
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(
                cells
                    .entry(tenant.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        let partition = cell
            .get_or_try_init(|| self.store.partition(tenant))
            .await
            .map_err(|source| CoreError::TenantUnavailable {
                tenant: tenant.as_str().to_string(),
                source,
            })?;

        Ok(Arc::clone(partition))
    }
}
