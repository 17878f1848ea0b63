//! # Tenant Resolution
//!
//! This module validates the `X-Tenant-Id` header against the tenant catalog
//! and attaches the resolved tenant to the request for downstream extractors.
//! Catalog management routes and the health endpoints sit outside it.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use utoipa::IntoParams;

use crate::domain::TenantId;
use crate::error::{ApiError, validation_error};
use crate::server::AppState;
use crate::tenancy::TenantCatalog;

/// Header that scopes a request to one tenant partition
pub const TENANT_HEADER: &str = "X-Tenant-Id";

/// Tenant resolved for the current request, stored in request extensions
#[derive(Debug, Clone)]
pub struct TenantContext(pub TenantId);

/// Middleware that resolves the request tenant from the `X-Tenant-Id` header.
///
/// Missing or malformed ids are rejected with 400 before any storage is
/// touched; ids not registered in the catalog get 404.
pub async fn tenant_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = request
        .headers()
        .get(TENANT_HEADER)
        .ok_or_else(|| {
            validation_error(
                "Missing required header",
                serde_json::json!({ "X-Tenant-Id": "Required header is missing" }),
            )
        })?
        .to_str()
        .map_err(|_| {
            validation_error(
                "Invalid tenant header",
                serde_json::json!({ "X-Tenant-Id": "Header must be valid UTF-8" }),
            )
        })?;

    let tenant = TenantId::new(header_value)?;

    if !TenantCatalog::new(&state.db).exists(&tenant).await? {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Tenant does not exist",
        ));
    }

    tracing::debug!(tenant_id = %tenant, "Resolved request tenant");
    request.extensions_mut().insert(TenantContext(tenant));

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or_else(|| {
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "TENANT_CONTEXT_MISSING",
                    "Tenant context not present on the request",
                )
            })
    }
}

/// OpenAPI header parameter for X-Tenant-Id
#[derive(Debug, serde::Serialize, serde::Deserialize, IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Header)]
pub struct TenantHeader {
    /// Tenant identifier that scopes the request to a specific tenant
    #[serde(rename = "X-Tenant-Id")]
    #[param(rename = "X-Tenant-Id")]
    pub tenant_id: String,
}
