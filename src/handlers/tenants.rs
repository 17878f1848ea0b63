//! # Tenants API Handlers
//!
//! This module contains handlers for the tenant catalog endpoints. These
//! routes manage the catalog itself and do not sit behind the tenant
//! middleware.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::TenantId;
use crate::error::ApiError;
use crate::models::tenant::Model as TenantModel;
use crate::server::AppState;
use crate::tenancy::TenantCatalog;

/// Request payload for registering a new tenant
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTenantRequest {
    /// Tenant slug used in the X-Tenant-Id header (1-64 chars, `[A-Za-z0-9_-]`)
    #[schema(example = "acme")]
    pub id: String,
    /// Display name for the tenant
    #[schema(example = "Acme Corp")]
    pub display_name: Option<String>,
}

/// A registered tenant as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TenantResponse {
    /// Tenant slug (primary key)
    #[schema(example = "acme")]
    pub id: String,
    /// Display name of the tenant
    #[schema(example = "Acme Corp")]
    pub display_name: Option<String>,
    /// Timestamp when the tenant was registered (ISO 8601)
    #[schema(example = "2026-01-15T10:30:00Z")]
    pub created_at: String,
}

impl From<TenantModel> for TenantResponse {
    fn from(model: TenantModel) -> Self {
        Self {
            id: model.id,
            display_name: model.display_name,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// Register a new tenant
#[utoipa::path(
    post,
    path = "/api/v1/tenants",
    request_body = CreateTenantRequest,
    responses(
        (status = 201, description = "Tenant registered", body = TenantResponse, headers(
            ("Location", description = "URL of the created tenant")
        )),
        (status = 400, description = "Invalid tenant slug", body = ApiError),
        (status = 409, description = "Tenant already exists", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn create_tenant(
    State(state): State<AppState>,
    payload: Result<Json<CreateTenantRequest>, JsonRejection>,
) -> Result<(StatusCode, [(&'static str, String); 1], Json<TenantResponse>), ApiError> {
    let Json(payload) = payload?;
    let id = TenantId::new(&payload.id)?;

    let tenant = TenantCatalog::new(&state.db)
        .create(&id, payload.display_name)
        .await?;

    tracing::info!(tenant_id = %id, "Registered tenant");

    let location = format!("/api/v1/tenants/{}", tenant.id);
    Ok((
        StatusCode::CREATED,
        [("Location", location)],
        Json(TenantResponse::from(tenant)),
    ))
}

/// List every registered tenant
#[utoipa::path(
    get,
    path = "/api/v1/tenants",
    responses(
        (status = 200, description = "All registered tenants, oldest first", body = [TenantResponse]),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn list_tenants(
    State(state): State<AppState>,
) -> Result<Json<Vec<TenantResponse>>, ApiError> {
    let tenants = TenantCatalog::new(&state.db).list().await?;
    Ok(Json(tenants.into_iter().map(TenantResponse::from).collect()))
}

/// Get a tenant by slug
#[utoipa::path(
    get,
    path = "/api/v1/tenants/{id}",
    params(
        ("id" = String, Path, description = "Tenant slug")
    ),
    responses(
        (status = 200, description = "Tenant found", body = TenantResponse),
        (status = 400, description = "Invalid tenant slug", body = ApiError),
        (status = 404, description = "Tenant not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn get_tenant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TenantResponse>, ApiError> {
    let id = TenantId::new(&id)?;

    let tenant = TenantCatalog::new(&state.db)
        .get(&id)
        .await?
        .ok_or_else(|| {
            ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Tenant does not exist")
        })?;

    Ok(Json(TenantResponse::from(tenant)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{create_app, create_test_app_state};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_create_tenant_returns_201_with_location() {
        let state = create_test_app_state().await;
        let app = create_app(state);

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/tenants")
            .header("Content-Type", "application/json")
            .body(Body::from(
                json!({ "id": "globex", "display_name": "Globex" }).to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get("Location").unwrap(),
            "/api/v1/tenants/globex"
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let tenant: TenantResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(tenant.id, "globex");
        assert_eq!(tenant.display_name.as_deref(), Some("Globex"));
    }

    #[tokio::test]
    async fn test_create_tenant_rejects_bad_slug() {
        let state = create_test_app_state().await;
        let app = create_app(state);

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/tenants")
            .header("Content-Type", "application/json")
            .body(Body::from(json!({ "id": "no spaces allowed" }).to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error_json["code"], "INVALID_IDENTIFIER");
    }

    #[tokio::test]
    async fn test_create_tenant_twice_conflicts() {
        let state = create_test_app_state().await;
        let app = create_app(state);

        for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
            let request = Request::builder()
                .method("POST")
                .uri("/api/v1/tenants")
                .header("Content-Type", "application/json")
                .body(Body::from(json!({ "id": "initech" }).to_string()))
                .unwrap();

            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), expected);
        }
    }

    #[tokio::test]
    async fn test_get_tenant_not_found() {
        let state = create_test_app_state().await;
        let app = create_app(state);

        let request = Request::builder()
            .method("GET")
            .uri("/api/v1/tenants/ghost")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_tenants_includes_seeded_tenant() {
        let state = create_test_app_state().await;
        let app = create_app(state);

        let request = Request::builder()
            .method("GET")
            .uri("/api/v1/tenants")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let tenants: Vec<TenantResponse> = serde_json::from_slice(&body).unwrap();
        assert!(tenants.iter().any(|tenant| tenant.id == "acme"));
    }
}
