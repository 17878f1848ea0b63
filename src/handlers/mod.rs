//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the Workboard API.

pub mod employees;
pub mod kpis;
pub mod schema;
pub mod tasks;
pub mod tenants;

use axum::{extract::State, http::StatusCode, response::Json};

use crate::error::ApiError;
use crate::models::ServiceInfo;
use crate::server::AppState;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness probe that pings the tenant catalog database
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Tenant catalog unreachable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn healthz(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    crate::db::health_check(&state.db).await.map_err(|error| {
        tracing::error!(error = %error, "Catalog health check failed");
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "CATALOG_UNAVAILABLE",
            "Tenant catalog is not reachable",
        )
    })?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
