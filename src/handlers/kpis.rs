//! # KPIs API Handlers
//!
//! Endpoints for attaching KPIs to tasks and running evaluations over the
//! task's activity logs.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{TenantContext, TenantHeader};
use crate::domain::{Kpi, KpiPayload, RecordId};
use crate::error::ApiError;
use crate::evaluation::Evaluation;
use crate::repositories::KpiRepository;
use crate::server::AppState;

/// Parameters for an evaluation run
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EvaluationRequest {
    /// Inclusive start of the evaluation window
    #[serde(rename = "startDate")]
    pub start_date: DateTime<Utc>,
    /// Inclusive end of the evaluation window
    #[serde(rename = "endDate")]
    pub end_date: DateTime<Utc>,
    /// English weekday names excluded from the window
    #[serde(rename = "excludedDays", default)]
    #[schema(example = json!(["Saturday", "Sunday"]))]
    pub excluded_days: Vec<String>,
}

/// List every KPI of the tenant
#[utoipa::path(
    get,
    path = "/api/v1/kpis",
    params(TenantHeader),
    responses(
        (status = 200, description = "All KPI records", body = [Kpi]),
        (status = 400, description = "Missing or malformed tenant header", body = ApiError),
        (status = 404, description = "Unknown tenant", body = ApiError),
        (status = 503, description = "Tenant partition unavailable", body = ApiError)
    ),
    tag = "kpis"
)]
pub async fn list_kpis(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
) -> Result<Json<Vec<Kpi>>, ApiError> {
    let kpis = KpiRepository::new(&state.models, &tenant).list().await?;
    Ok(Json(kpis))
}

/// Attach a KPI to a task
///
/// `Time_Unit` must lie in 0..=5. The KPI record is written first and then
/// linked into the task's `Kpis` list.
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{task_id}/kpis",
    params(
        ("task_id" = String, Path, description = "Task record id"),
        TenantHeader
    ),
    request_body = KpiPayload,
    responses(
        (status = 201, description = "KPI created and linked", body = Kpi, headers(
            ("Location", description = "URL of the created KPI")
        )),
        (status = 400, description = "Malformed id, body, or Time_Unit out of range", body = ApiError),
        (status = 404, description = "Task not found", body = ApiError)
    ),
    tag = "kpis"
)]
pub async fn create_kpi(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(task_id): Path<String>,
    payload: Result<Json<KpiPayload>, JsonRejection>,
) -> Result<(StatusCode, [(&'static str, String); 1], Json<Kpi>), ApiError> {
    let task_id = RecordId::parse(&task_id)?;
    let Json(payload) = payload?;
    let kpi = KpiRepository::new(&state.models, &tenant)
        .create_for_task(task_id, payload)
        .await?;

    let location = format!("/api/v1/kpis/{}", kpi.id);
    Ok((StatusCode::CREATED, [("Location", location)], Json(kpi)))
}

/// List the KPIs attached to a task
///
/// KPIs are returned in the order the task references them; dangling
/// references are skipped.
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{task_id}/kpis",
    params(
        ("task_id" = String, Path, description = "Task record id"),
        TenantHeader
    ),
    responses(
        (status = 200, description = "KPIs attached to the task", body = [Kpi]),
        (status = 404, description = "Task not found", body = ApiError)
    ),
    tag = "kpis"
)]
pub async fn task_kpis(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(task_id): Path<String>,
) -> Result<Json<Vec<Kpi>>, ApiError> {
    let task_id = RecordId::parse(&task_id)?;
    let kpis = KpiRepository::new(&state.models, &tenant)
        .of_task(task_id)
        .await?;
    Ok(Json(kpis))
}

/// Get a KPI by id
#[utoipa::path(
    get,
    path = "/api/v1/kpis/{kpi_id}",
    params(
        ("kpi_id" = String, Path, description = "KPI record id"),
        TenantHeader
    ),
    responses(
        (status = 200, description = "KPI found", body = Kpi),
        (status = 400, description = "Malformed record id", body = ApiError),
        (status = 404, description = "KPI not found", body = ApiError)
    ),
    tag = "kpis"
)]
pub async fn get_kpi(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(kpi_id): Path<String>,
) -> Result<Json<Kpi>, ApiError> {
    let kpi_id = RecordId::parse(&kpi_id)?;
    let kpi = KpiRepository::new(&state.models, &tenant).get(kpi_id).await?;
    Ok(Json(kpi))
}

/// Evaluate a KPI against a task's logs
///
/// Scores the logs inside the inclusive window, skipping excluded
/// weekdays, and reports the distinct-value percentage against the
/// window-scaled target.
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{task_id}/kpis/{kpi_id}/evaluation",
    params(
        ("task_id" = String, Path, description = "Task record id"),
        ("kpi_id" = String, Path, description = "KPI record id"),
        TenantHeader
    ),
    request_body = EvaluationRequest,
    responses(
        (status = 200, description = "Evaluation result", body = Evaluation),
        (status = 400, description = "Malformed ids or body", body = ApiError),
        (status = 404, description = "Task or KPI not found", body = ApiError)
    ),
    tag = "kpis"
)]
pub async fn evaluate_kpi(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path((task_id, kpi_id)): Path<(String, String)>,
    payload: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Result<Json<Evaluation>, ApiError> {
    let task_id = RecordId::parse(&task_id)?;
    let kpi_id = RecordId::parse(&kpi_id)?;
    let Json(request) = payload?;

    let evaluation = KpiRepository::new(&state.models, &tenant)
        .evaluate(
            task_id,
            kpi_id,
            request.start_date,
            request.end_date,
            &request.excluded_days,
        )
        .await?;
    Ok(Json(evaluation))
}
