//! KPI repository
//!
//! This module provides the KpiRepository struct covering KPI records,
//! their task linkage, and the evaluation entry point that scores a KPI
//! against its task's logs.

use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};

use crate::domain::{EntityKind, Filter, Kpi, KpiPayload, Patch, RecordId, Task, TenantId, decode};
use crate::error::CoreError;
use crate::evaluation::{self, Evaluation};
use crate::repositories::TaskRepository;
use crate::tenancy::{ModelAccessor, ModelRegistry};

/// Repository for KPI records within one tenant's partition.
pub struct KpiRepository<'a> {
    models: &'a ModelRegistry,
    tenant: &'a TenantId,
}

impl<'a> KpiRepository<'a> {
    pub fn new(models: &'a ModelRegistry, tenant: &'a TenantId) -> Self {
        Self { models, tenant }
    }

    async fn kpis(&self) -> Result<ModelAccessor, CoreError> {
        self.models.resolve(self.tenant, EntityKind::Kpi).await
    }

    /// All KPIs of the tenant, oldest first.
    pub async fn list(&self) -> Result<Vec<Kpi>, CoreError> {
        let kpis = self.kpis().await?;
        let docs = kpis.find_many(&Filter::all()).await?;
        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            records.push(decode(doc)?);
        }
        Ok(records)
    }

    /// Create a KPI under a task and link it into the task's KPI
    /// reference set.
    ///
    /// The KPI record is written first, mirroring task creation: a
    /// missing task leaves the already written KPI behind unlinked.
    pub async fn create_for_task(
        &self,
        task_id: RecordId,
        payload: KpiPayload,
    ) -> Result<Kpi, CoreError> {
        payload.validate()?;

        let kpis = self.kpis().await?;
        let doc = kpis.insert(payload.into_fields(task_id)).await?;
        let kpi: Kpi = decode(doc)?;

        let tasks = self.models.resolve(self.tenant, EntityKind::Task).await?;
        let matched = tasks
            .update_one(
                &Filter::by_id(task_id),
                &Patch::new().push("Kpis", kpi.id.to_string()),
            )
            .await?;
        if matched == 0 {
            tracing::warn!(
                tenant_id = %self.tenant,
                task_id = %task_id,
                kpi_id = %kpi.id,
                "task not found after kpi insert, kpi record left orphaned"
            );
            return Err(CoreError::not_found("Task"));
        }
        Ok(kpi)
    }

    /// KPIs referenced by the given task, in reference order.
    ///
    /// References that no longer resolve to a record are skipped.
    pub async fn of_task(&self, task_id: RecordId) -> Result<Vec<Kpi>, CoreError> {
        let tasks = self.models.resolve(self.tenant, EntityKind::Task).await?;
        let doc = tasks
            .find_one(&Filter::by_id(task_id))
            .await?
            .ok_or(CoreError::not_found("Task"))?;
        let task: Task = decode(doc)?;

        let kpis = self.kpis().await?;
        let mut records = Vec::with_capacity(task.kpis.len());
        for kpi_id in task.kpis {
            if let Some(doc) = kpis.find_one(&Filter::by_id(kpi_id)).await? {
                records.push(decode(doc)?);
            }
        }
        Ok(records)
    }

    pub async fn get(&self, id: RecordId) -> Result<Kpi, CoreError> {
        let kpis = self.kpis().await?;
        let doc = kpis
            .find_one(&Filter::by_id(id))
            .await?
            .ok_or(CoreError::not_found("KPI"))?;
        Ok(decode(doc)?)
    }

    /// Score a KPI against the task's logs over an inclusive date window.
    pub async fn evaluate(
        &self,
        task_id: RecordId,
        kpi_id: RecordId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        excluded_days: &[String],
    ) -> Result<Evaluation, CoreError> {
        let started = Instant::now();
        let kpi = self.get(kpi_id).await?;
        let task = TaskRepository::new(self.models, self.tenant)
            .get(task_id)
            .await?;

        let result = evaluation::evaluate(&kpi, &task.task_logs, start, end, excluded_days);

        let metric_labels = vec![("tenant_id", self.tenant.as_str().to_string())];
        counter!("kpi_evaluations_total", &metric_labels).increment(1);
        histogram!("kpi_evaluation_duration_ms").record(started.elapsed().as_secs_f64() * 1_000.0);
        tracing::debug!(
            tenant_id = %self.tenant,
            task_id = %task_id,
            kpi_id = %kpi_id,
            total_count = result.total_count,
            days_considered = result.days_considered,
            "kpi evaluated"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EmployeePayload, TaskLogPayload, TaskPayload};
    use crate::repositories::EmployeeRepository;
    use crate::storage::memory::MemoryStore;
    use crate::tenancy::PartitionRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn registry() -> ModelRegistry {
        ModelRegistry::new(Arc::new(PartitionRegistry::new(Arc::new(
            MemoryStore::new(),
        ))))
    }

    fn tenant() -> TenantId {
        TenantId::new("acme").unwrap()
    }

    fn kpi_payload(time_unit: i64) -> KpiPayload {
        serde_json::from_value(json!({
            "Title": "Distinct customers",
            "Target": 10.0,
            "Time_Unit": time_unit,
            "Field_To_Be_Evaluated": "customer"
        }))
        .unwrap()
    }

    async fn task(models: &ModelRegistry, tenant: &TenantId) -> RecordId {
        let employee: EmployeePayload = serde_json::from_value(json!({
            "Name": "Ana",
            "Department": "Sales",
            "Work_position": "Account Executive",
            "Role": 2
        }))
        .unwrap();
        let employee_id = EmployeeRepository::new(models, tenant)
            .create(employee)
            .await
            .unwrap()
            .id;

        let payload: TaskPayload = serde_json::from_value(json!({
            "Title": "Q1 outreach",
            "Priority": 1,
            "Start_Date": "2026-03-02T09:00:00Z",
            "End_Date": "2026-03-31T17:00:00Z",
            "Concurrence": false,
            "State": "open"
        }))
        .unwrap();
        TaskRepository::new(models, tenant)
            .create_for_employee(employee_id, payload)
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn create_attaches_the_kpi_to_its_task() {
        let models = registry();
        let tenant = tenant();
        let task_id = task(&models, &tenant).await;
        let repo = KpiRepository::new(&models, &tenant);

        let kpi = repo.create_for_task(task_id, kpi_payload(1)).await.unwrap();

        assert_eq!(kpi.task_id, Some(task_id));
        let owner = TaskRepository::new(&models, &tenant)
            .get(task_id)
            .await
            .unwrap();
        assert_eq!(owner.kpis, vec![kpi.id]);
    }

    #[tokio::test]
    async fn create_rejects_time_unit_outside_bounds() {
        let models = registry();
        let tenant = tenant();
        let task_id = task(&models, &tenant).await;
        let repo = KpiRepository::new(&models, &tenant);

        for time_unit in [-1, 6] {
            let err = repo
                .create_for_task(task_id, kpi_payload(time_unit))
                .await
                .unwrap_err();
            assert!(matches!(err, CoreError::InvalidRange { .. }));
        }
    }

    #[tokio::test]
    async fn create_for_missing_task_fails_and_leaves_the_kpi() {
        let models = registry();
        let tenant = tenant();
        let repo = KpiRepository::new(&models, &tenant);

        let err = repo
            .create_for_task(RecordId::generate(), kpi_payload(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "Task" }));

        // The KPI record was written before the link failed.
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn of_task_resolves_references_in_order() {
        let models = registry();
        let tenant = tenant();
        let task_id = task(&models, &tenant).await;
        let repo = KpiRepository::new(&models, &tenant);

        let first = repo.create_for_task(task_id, kpi_payload(1)).await.unwrap();
        let second = repo.create_for_task(task_id, kpi_payload(2)).await.unwrap();

        let ids: Vec<RecordId> = repo
            .of_task(task_id)
            .await
            .unwrap()
            .into_iter()
            .map(|k| k.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn of_task_skips_dangling_references() {
        let models = registry();
        let tenant = tenant();
        let task_id = task(&models, &tenant).await;
        let repo = KpiRepository::new(&models, &tenant);

        let kpi = repo.create_for_task(task_id, kpi_payload(1)).await.unwrap();
        models
            .resolve(&tenant, EntityKind::Task)
            .await
            .unwrap()
            .update_one(
                &Filter::by_id(task_id),
                &Patch::new().push("Kpis", RecordId::generate().to_string()),
            )
            .await
            .unwrap();

        let ids: Vec<RecordId> = repo
            .of_task(task_id)
            .await
            .unwrap()
            .into_iter()
            .map(|k| k.id)
            .collect();
        assert_eq!(ids, vec![kpi.id]);
    }

    #[tokio::test]
    async fn of_task_with_unknown_task_is_not_found() {
        let models = registry();
        let tenant = tenant();
        let repo = KpiRepository::new(&models, &tenant);

        let err = repo.of_task(RecordId::generate()).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "Task" }));
    }

    #[tokio::test]
    async fn get_unknown_kpi_is_not_found() {
        let models = registry();
        let tenant = tenant();
        let repo = KpiRepository::new(&models, &tenant);

        let err = repo.get(RecordId::generate()).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "KPI" }));
    }

    #[tokio::test]
    async fn evaluate_scores_the_task_logs() {
        let models = registry();
        let tenant = tenant();
        let task_id = task(&models, &tenant).await;
        let tasks = TaskRepository::new(&models, &tenant);
        let repo = KpiRepository::new(&models, &tenant);

        let kpi = repo.create_for_task(task_id, kpi_payload(1)).await.unwrap();
        for customer in ["acme", "globex", "initech"] {
            let log: TaskLogPayload = serde_json::from_value(json!({
                "registerDate": "2026-03-03T10:00:00Z",
                "customer": customer
            }))
            .unwrap();
            tasks.append_log(task_id, log).await.unwrap();
        }

        let result = repo
            .evaluate(
                task_id,
                kpi.id,
                "2026-03-02T00:00:00Z".parse().unwrap(),
                "2026-03-06T23:59:59Z".parse().unwrap(),
                &[],
            )
            .await
            .unwrap();

        assert_eq!(result.days_considered, 5);
        assert_eq!(result.target_sales, 50.0);
        assert_eq!(result.total_count, 3);
        assert_eq!(result.kpi_percentage, 6.0);
    }

    #[tokio::test]
    async fn evaluate_with_unknown_kpi_is_not_found() {
        let models = registry();
        let tenant = tenant();
        let task_id = task(&models, &tenant).await;
        let repo = KpiRepository::new(&models, &tenant);

        let err = repo
            .evaluate(
                task_id,
                RecordId::generate(),
                "2026-03-02T00:00:00Z".parse().unwrap(),
                "2026-03-06T23:59:59Z".parse().unwrap(),
                &[],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "KPI" }));
    }
}
