//! # Schema API Handlers
//!
//! Runtime schema extension: registering a new field on one of the record
//! kinds for the requesting tenant.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{TenantContext, TenantHeader};
use crate::domain::EntityKind;
use crate::error::ApiError;
use crate::server::AppState;

/// Request payload for registering a schema extension
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddFieldRequest {
    /// Name of the new field
    #[serde(rename = "fieldName")]
    #[schema(example = "region")]
    pub field_name: String,
    /// Declared type: string, number, boolean or date
    #[serde(rename = "fieldType")]
    #[schema(example = "string")]
    pub field_type: String,
    /// Default stamped onto existing and future records. Omitted means a
    /// type-derived fallback.
    #[serde(
        rename = "defaultValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<serde_json::Value>,
}

/// Result of registering a schema extension
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddFieldResponse {
    #[schema(example = "Field 'region' of type 'string' added successfully")]
    pub message: String,
    /// Number of existing records the default was stamped onto
    pub updated: u64,
}

/// Register a new field on a record kind
///
/// The field becomes part of the tenant's schema for that kind: its default
/// is written onto every existing record and onto future inserts that omit
/// it. Base field names are reserved.
#[utoipa::path(
    post,
    path = "/api/v1/schema/{kind}/fields",
    params(
        ("kind" = String, Path, description = "Record kind: employees, tasks or kpis"),
        TenantHeader
    ),
    request_body = AddFieldRequest,
    responses(
        (status = 200, description = "Field registered", body = AddFieldResponse),
        (status = 400, description = "Unknown kind, reserved name, or bad type/default", body = ApiError),
        (status = 404, description = "Unknown tenant", body = ApiError),
        (status = 503, description = "Tenant partition unavailable", body = ApiError)
    ),
    tag = "schema"
)]
pub async fn add_field(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(kind): Path<String>,
    payload: Result<Json<AddFieldRequest>, JsonRejection>,
) -> Result<Json<AddFieldResponse>, ApiError> {
    let kind: EntityKind = kind.parse()?;
    let Json(payload) = payload?;

    let updated = state
        .models
        .add_field(
            &tenant,
            kind,
            &payload.field_name,
            &payload.field_type,
            payload.default_value.as_ref(),
        )
        .await?;

    Ok(Json(AddFieldResponse {
        message: format!(
            "Field '{}' of type '{}' added successfully",
            payload.field_name, payload.field_type
        ),
        updated,
    }))
}
