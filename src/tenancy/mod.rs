//! # Tenancy
//!
//! Tenant resolution plumbing: the catalog of registered tenants in the
//! control database, the partition registry that opens each tenant's
//! storage at most once, and the model registry that layers runtime
//! schema extensions on top of the partitions.

pub mod catalog;
pub mod models;
pub mod registry;

pub use catalog::TenantCatalog;
pub use models::{FieldExtension, ModelAccessor, ModelRegistry};
pub use registry::PartitionRegistry;
