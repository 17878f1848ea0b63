//! Task repository
//!
//! This module provides the TaskRepository struct covering task records,
//! their employee linkage, and the append-only activity log attached to
//! each task.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::domain::{
    Employee, EntityKind, Filter, Patch, RecordId, Task, TaskLog, TaskLogPayload, TaskPayload,
    TaskUpdate, TenantId, decode,
};
use crate::error::CoreError;
use crate::tenancy::{ModelAccessor, ModelRegistry};

/// Outcome of removing a task from an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRemoval {
    /// The reference was removed and the task record deleted.
    Deleted,
    /// The task was not in the employee's reference set; nothing was deleted.
    NotLinked,
}

/// Repository for task records within one tenant's partition.
pub struct TaskRepository<'a> {
    models: &'a ModelRegistry,
    tenant: &'a TenantId,
}

impl<'a> TaskRepository<'a> {
    pub fn new(models: &'a ModelRegistry, tenant: &'a TenantId) -> Self {
        Self { models, tenant }
    }

    async fn tasks(&self) -> Result<ModelAccessor, CoreError> {
        self.models.resolve(self.tenant, EntityKind::Task).await
    }

    async fn employees(&self) -> Result<ModelAccessor, CoreError> {
        self.models.resolve(self.tenant, EntityKind::Employee).await
    }

    /// All tasks of the tenant, oldest first.
    pub async fn list(&self) -> Result<Vec<Task>, CoreError> {
        let tasks = self.tasks().await?;
        let docs = tasks.find_many(&Filter::all()).await?;
        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            records.push(decode(doc)?);
        }
        Ok(records)
    }

    /// Create a task under an employee and link it into the employee's
    /// task reference set.
    ///
    /// The task record is written first. When the employee turns out not
    /// to exist the already written task stays behind unlinked; callers
    /// get `NotFound` either way.
    pub async fn create_for_employee(
        &self,
        employee_id: RecordId,
        payload: TaskPayload,
    ) -> Result<Task, CoreError> {
        let tasks = self.tasks().await?;
        let doc = tasks.insert(payload.into_fields(employee_id)).await?;
        let task: Task = decode(doc)?;

        let employees = self.employees().await?;
        let matched = employees
            .update_one(
                &Filter::by_id(employee_id),
                &Patch::new().push("Tasks", task.id.to_string()),
            )
            .await?;
        if matched == 0 {
            tracing::warn!(
                tenant_id = %self.tenant,
                employee_id = %employee_id,
                task_id = %task.id,
                "employee not found after task insert, task record left orphaned"
            );
            return Err(CoreError::not_found("Employee"));
        }
        Ok(task)
    }

    /// Tasks created under the given employee.
    pub async fn of_employee(&self, employee_id: RecordId) -> Result<Vec<Task>, CoreError> {
        let tasks = self.tasks().await?;
        let docs = tasks
            .find_many(&Filter::all().field("employeeId", employee_id.to_string()))
            .await?;
        if docs.is_empty() {
            return Err(CoreError::not_found("Employee"));
        }
        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            records.push(decode(doc)?);
        }
        Ok(records)
    }

    pub async fn get(&self, id: RecordId) -> Result<Task, CoreError> {
        let tasks = self.tasks().await?;
        let doc = tasks
            .find_one(&Filter::by_id(id))
            .await?
            .ok_or(CoreError::not_found("Task"))?;
        Ok(decode(doc)?)
    }

    /// Fetch a task, requiring that it was created under the given employee.
    pub async fn get_for_employee(
        &self,
        employee_id: RecordId,
        task_id: RecordId,
    ) -> Result<Task, CoreError> {
        let tasks = self.tasks().await?;
        let doc = tasks
            .find_one(&Filter::by_id(task_id).field("employeeId", employee_id.to_string()))
            .await?
            .ok_or(CoreError::not_found("Task"))?;
        Ok(decode(doc)?)
    }

    /// Apply a partial update and return the updated record.
    pub async fn update(&self, id: RecordId, update: TaskUpdate) -> Result<Task, CoreError> {
        let tasks = self.tasks().await?;
        let filter = Filter::by_id(id);
        let matched = tasks.update_one(&filter, &update.into_patch()).await?;
        if matched == 0 {
            return Err(CoreError::not_found("Task"));
        }
        let doc = tasks
            .find_one(&filter)
            .await?
            .ok_or(CoreError::not_found("Task"))?;
        Ok(decode(doc)?)
    }

    /// Unlink a task from its employee and delete the task record.
    ///
    /// The reference is removed before the record is deleted. A task id
    /// that is not in the employee's reference set deletes nothing.
    pub async fn delete(
        &self,
        employee_id: RecordId,
        task_id: RecordId,
    ) -> Result<TaskRemoval, CoreError> {
        let employees = self.employees().await?;
        let doc = employees
            .find_one(&Filter::by_id(employee_id))
            .await?
            .ok_or(CoreError::not_found("Employee"))?;
        let employee: Employee = decode(doc)?;
        if !employee.tasks.contains(&task_id) {
            return Ok(TaskRemoval::NotLinked);
        }

        employees
            .update_one(
                &Filter::by_id(employee_id),
                &Patch::new().pull("Tasks", task_id.to_string()),
            )
            .await?;

        let tasks = self.tasks().await?;
        let deleted = tasks.delete_one(&Filter::by_id(task_id)).await?;
        if deleted == 0 {
            return Err(CoreError::not_found("Task"));
        }
        Ok(TaskRemoval::Deleted)
    }

    /// Project just the task's title.
    pub async fn title_of(&self, id: RecordId) -> Result<String, CoreError> {
        Ok(self.get(id).await?.title)
    }

    /// Append a log entry to the task and return the updated record.
    pub async fn append_log(
        &self,
        task_id: RecordId,
        payload: TaskLogPayload,
    ) -> Result<Task, CoreError> {
        let tasks = self.tasks().await?;
        let filter = Filter::by_id(task_id);
        let matched = tasks
            .update_one(
                &filter,
                &Patch::new().push("Task_Logs", payload.into_log().into_value()),
            )
            .await?;
        if matched == 0 {
            return Err(CoreError::not_found("Task"));
        }
        let doc = tasks
            .find_one(&filter)
            .await?
            .ok_or(CoreError::not_found("Task"))?;
        Ok(decode(doc)?)
    }

    /// The task's log entries, oldest first.
    pub async fn logs_of(&self, task_id: RecordId) -> Result<Vec<TaskLog>, CoreError> {
        Ok(self.get(task_id).await?.task_logs)
    }

    /// Every field name appearing in the task's logs, sorted. A task with
    /// no logs yields no keys.
    pub async fn log_keys(&self, task_id: RecordId) -> Result<Vec<String>, CoreError> {
        let task = self.get(task_id).await?;
        let mut keys = BTreeSet::new();
        for log in &task.task_logs {
            keys.insert("registerDate".to_string());
            for key in log.fields.keys() {
                keys.insert(key.clone());
            }
        }
        Ok(keys.into_iter().collect())
    }

    /// Create the same task under every employee whose record has `field`
    /// equal to `value`.
    ///
    /// Creation is best effort per employee: one failure is logged and
    /// skipped rather than aborting the rest. Returns how many employees
    /// received the task, failing with `NotFound` only when no employee
    /// matched at all.
    pub async fn create_by_field(
        &self,
        field: &str,
        value: &Value,
        payload: TaskPayload,
    ) -> Result<u64, CoreError> {
        let employees = self.employees().await?;
        let docs = employees
            .find_many(&Filter::all().field(field, value.clone()))
            .await?;
        if docs.is_empty() {
            return Err(CoreError::not_found("Employee"));
        }

        let mut created = 0;
        for doc in docs {
            let employee_id = doc.id;
            match self.create_for_employee(employee_id, payload.clone()).await {
                Ok(_) => created += 1,
                Err(error) => {
                    tracing::warn!(
                        tenant_id = %self.tenant,
                        employee_id = %employee_id,
                        error = %error,
                        "skipping employee during bulk task creation"
                    );
                }
            }
        }
        Ok(created)
    }
}
