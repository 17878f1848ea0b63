//! # Data Models
//!
//! SeaORM entity models used by the Workboard API: the tenant catalog in
//! the control database and the record rows inside partition databases.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod record;
pub mod tenant;

pub use record::Entity as Record;
pub use tenant::Entity as Tenant;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "workboard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
