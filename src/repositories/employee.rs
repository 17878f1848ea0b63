//! Employee repository
//!
//! This module provides the EmployeeRepository struct which wraps the
//! tenant-scoped document store with employee record operations.

use crate::domain::{
    Employee, EmployeePayload, EmployeeUpdate, EntityKind, Filter, RecordId, TenantId, decode,
};
use crate::error::CoreError;
use crate::tenancy::{ModelAccessor, ModelRegistry};

/// Repository for employee records within one tenant's partition.
pub struct EmployeeRepository<'a> {
    models: &'a ModelRegistry,
    tenant: &'a TenantId,
}

impl<'a> EmployeeRepository<'a> {
    pub fn new(models: &'a ModelRegistry, tenant: &'a TenantId) -> Self {
        Self { models, tenant }
    }

    async fn employees(&self) -> Result<ModelAccessor, CoreError> {
        self.models.resolve(self.tenant, EntityKind::Employee).await
    }

    /// All employees of the tenant, oldest first.
    pub async fn list(&self) -> Result<Vec<Employee>, CoreError> {
        let employees = self.employees().await?;
        let docs = employees.find_many(&Filter::all()).await?;
        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            records.push(decode(doc)?);
        }
        Ok(records)
    }

    pub async fn create(&self, payload: EmployeePayload) -> Result<Employee, CoreError> {
        let employees = self.employees().await?;
        let doc = employees.insert(payload.into_fields()).await?;
        Ok(decode(doc)?)
    }

    pub async fn get(&self, id: RecordId) -> Result<Employee, CoreError> {
        let employees = self.employees().await?;
        let doc = employees
            .find_one(&Filter::by_id(id))
            .await?
            .ok_or(CoreError::not_found("Employee"))?;
        Ok(decode(doc)?)
    }

    /// Apply a partial update and return the updated record.
    pub async fn update(&self, id: RecordId, update: EmployeeUpdate) -> Result<Employee, CoreError> {
        let employees = self.employees().await?;
        let filter = Filter::by_id(id);
        let matched = employees.update_one(&filter, &update.into_patch()).await?;
        if matched == 0 {
            return Err(CoreError::not_found("Employee"));
        }
        let doc = employees
            .find_one(&filter)
            .await?
            .ok_or(CoreError::not_found("Employee"))?;
        Ok(decode(doc)?)
    }

    /// Delete an employee record. Tasks created under it are left in place.
    pub async fn delete(&self, id: RecordId) -> Result<(), CoreError> {
        let employees = self.employees().await?;
        let deleted = employees.delete_one(&Filter::by_id(id)).await?;
        if deleted == 0 {
            return Err(CoreError::not_found("Employee"));
        }
        Ok(())
    }

    /// Project just the employee's name.
    pub async fn name_of(&self, id: RecordId) -> Result<String, CoreError> {
        Ok(self.get(id).await?.name)
    }
}
