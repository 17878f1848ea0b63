//! # Error Handling
//!
//! Unified error handling for the Workboard API: a typed core taxonomy for
//! the data layer plus a consistent problem+json response format with trace
//! ID propagation.

use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::storage::StorageError;
use crate::telemetry;

/// Errors surfaced by the data layer and the evaluation engine.
///
/// Every variant has a fixed HTTP mapping, applied when it is converted
/// into an [`ApiError`].
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid identifier: {reason}")]
    InvalidIdentifier { reason: String },
    #[error("invalid field type: {reason}")]
    InvalidFieldType { reason: String },
    #[error("field '{name}' is part of the base {kind} schema")]
    ReservedField { name: String, kind: &'static str },
    #[error("{field} must be between {min} and {max}, got {value}")]
    InvalidRange {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("tenant '{tenant}' is unavailable: {source}")]
    TenantUnavailable {
        tenant: String,
        #[source]
        source: StorageError,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CoreError {
    pub fn invalid_identifier<S: Into<String>>(reason: S) -> Self {
        CoreError::InvalidIdentifier {
            reason: reason.into(),
        }
    }

    pub fn invalid_field_type<S: Into<String>>(reason: S) -> Self {
        CoreError::InvalidFieldType {
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: &'static str) -> Self {
        CoreError::NotFound { entity }
    }

    /// HTTP status the variant maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CoreError::InvalidIdentifier { .. }
            | CoreError::InvalidFieldType { .. }
            | CoreError::ReservedField { .. }
            | CoreError::InvalidRange { .. } => StatusCode::BAD_REQUEST,
            CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::TenantUnavailable { .. } | CoreError::Storage(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    /// Stable error code for programmatic handling (SCREAMING_SNAKE_CASE).
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::InvalidIdentifier { .. } => "INVALID_IDENTIFIER",
            CoreError::InvalidFieldType { .. } => "INVALID_FIELD_TYPE",
            CoreError::ReservedField { .. } => "RESERVED_FIELD",
            CoreError::InvalidRange { .. } => "INVALID_RANGE",
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::TenantUnavailable { .. } => "TENANT_UNAVAILABLE",
            CoreError::Storage(_) => "STORAGE_UNAVAILABLE",
        }
    }
}

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable error message
    pub message: Box<str>,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Suggested retry delay in seconds (optional)
    pub retry_after: Option<u64>,
    /// Correlation trace ID for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    /// Create a new API error with the given status code and message
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            retry_after: None,
            trace_id: Self::current_trace_id(),
        }
    }

    /// Add details to the error
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Set retry after delay
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    /// Extract current trace ID from the active tracing span (falls back to generated correlation ID)
    fn current_trace_id() -> Option<Box<str>> {
        telemetry::current_trace_id()
            .map(|trace_id| trace_id.into_boxed_str())
            .or_else(|| {
                // Fallback: generate a correlation ID for basic client-server log correlation
                Some(format!("corr-{}", &uuid::Uuid::new_v4().to_string()[..8]).into_boxed_str())
            })
    }
}

fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_UNIQUE: &str = "23505";
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation() {
        return true;
    }

    if let Some(code) = db_error.code() {
        let code_str = code.as_ref();
        if code_str == PG_UNIQUE || SQLITE_DUPLICATE_CODES.contains(&code_str) {
            return true;
        }
    }

    false
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );

        // Add Retry-After header if present
        if let Some(retry_after) = self.retry_after
            && let Ok(header_value) = HeaderValue::from_str(&retry_after.to_string())
        {
            headers.insert("retry-after", header_value);
        }

        (self.status, headers, axum::Json(self)).into_response()
    }
}

// Error mappers for common sources

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match &error {
            CoreError::TenantUnavailable { tenant, source } => {
                tracing::error!(tenant_id = %tenant, error = %source, "Tenant partition unavailable");
            }
            CoreError::Storage(source) => {
                tracing::error!(error = %source, "Storage operation failed");
            }
            _ => {}
        }

        Self::new(error.status_code(), error.error_code(), &error.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        // Log the full error for debugging
        tracing::error!("Internal error: {:?}", error);

        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "An internal error occurred",
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("JSON syntax error: {}", err),
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            _ => "Invalid request body".to_string(),
        };

        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", &message)
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(error: sea_orm::DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, "Unique constraint violation detected");
            return Self::new(StatusCode::CONFLICT, "CONFLICT", "Resource already exists");
        }

        match error {
            sea_orm::DbErr::RecordNotFound(record) => Self::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Record not found: {}", record),
            ),
            sea_orm::DbErr::Query(query_err) => {
                tracing::error!("Database query error: {:?}", query_err);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Database error occurred",
                )
            }
            sea_orm::DbErr::Exec(exec_err) => {
                tracing::error!("Database execution error: {:?}", exec_err);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Database error occurred",
                )
            }
            sea_orm::DbErr::Conn(connection_err) => {
                tracing::error!("Database connection error: {:?}", connection_err);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Database service unavailable",
                )
            }
            _ => {
                tracing::error!("Database error: {:?}", error);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Database error occurred",
                )
            }
        }
    }
}

/// Create a validation error with field details
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(field_errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_api_error_basic() {
        let error = ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "Test error message",
        );

        assert_eq!(error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(error.message, Box::from("Test error message"));
        assert_eq!(error.details, None);
        assert_eq!(error.retry_after, None);
    }

    #[test]
    fn test_api_error_with_details() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", "Test error message")
            .with_details(json!({"field": "value"}));

        assert_eq!(error.details, Some(Box::new(json!({"field": "value"}))));
    }

    #[test]
    fn test_core_error_status_mapping() {
        let cases: Vec<(CoreError, StatusCode, &str)> = vec![
            (
                CoreError::invalid_identifier("bad id"),
                StatusCode::BAD_REQUEST,
                "INVALID_IDENTIFIER",
            ),
            (
                CoreError::invalid_field_type("'currency' is not a supported type"),
                StatusCode::BAD_REQUEST,
                "INVALID_FIELD_TYPE",
            ),
            (
                CoreError::ReservedField {
                    name: "Name".to_string(),
                    kind: "Employee",
                },
                StatusCode::BAD_REQUEST,
                "RESERVED_FIELD",
            ),
            (
                CoreError::InvalidRange {
                    field: "Time_Unit",
                    min: 0,
                    max: 5,
                    value: 9,
                },
                StatusCode::BAD_REQUEST,
                "INVALID_RANGE",
            ),
            (
                CoreError::not_found("Employee"),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
        ];

        for (error, status, code) in cases {
            let api_error: ApiError = error.into();
            assert_eq!(api_error.status, status);
            assert_eq!(api_error.code, Box::from(code));
        }
    }

    #[test]
    fn test_storage_errors_map_to_service_unavailable() {
        let storage = StorageError::Database(sea_orm::DbErr::Conn(
            sea_orm::RuntimeErr::Internal("connection refused".to_string()),
        ));
        let api_error: ApiError = CoreError::from(storage).into();
        assert_eq!(api_error.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api_error.code, Box::from("STORAGE_UNAVAILABLE"));

        let unavailable = CoreError::TenantUnavailable {
            tenant: "acme".to_string(),
            source: StorageError::MalformedDocument {
                id: "x".to_string(),
                message: "not an object".to_string(),
            },
        };
        let api_error: ApiError = unavailable.into();
        assert_eq!(api_error.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api_error.code, Box::from("TENANT_UNAVAILABLE"));
        assert!(api_error.message.contains("acme"));
    }

    #[test]
    fn test_from_anyhow() {
        let anyhow_error = anyhow::anyhow!("Something went wrong");
        let api_error: ApiError = anyhow_error.into();

        assert_eq!(api_error.code, Box::from("INTERNAL_SERVER_ERROR"));
        assert_eq!(api_error.message, Box::from("An internal error occurred"));
    }

    #[test]
    fn test_content_type_header() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", "Test error");

        let response = error.into_response();

        // Check that Content-Type header is set correctly
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/problem+json"
        );
    }

    #[test]
    fn test_retry_after_header() {
        let error = ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Catalog unavailable",
        )
        .with_retry_after(60);

        let response = error.into_response();

        // Check that Retry-After header is set
        assert_eq!(response.headers().get("retry-after").unwrap(), "60");

        // Check that Content-Type is still set
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/problem+json"
        );
    }

    #[test]
    fn test_status_code_preservation() {
        let error = ApiError::new(StatusCode::CONFLICT, "CONFLICT", "Resource already exists");

        let response = error.into_response();

        // Check that the status code is preserved
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_trace_id_generation() {
        let error = ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "Test error",
        );

        // Check that trace ID is generated and has the expected format
        assert!(error.trace_id.is_some());
        let trace_id = error.trace_id.unwrap();
        assert!(trace_id.starts_with("corr-"));
        assert_eq!(trace_id.len(), 13); // "corr-" + 8 chars
    }

    #[test]
    fn test_database_error_mapping() {
        let db_error = sea_orm::DbErr::RecordNotFound("test_record".to_string());
        let api_error: ApiError = db_error.into();

        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.code, Box::from("NOT_FOUND"));
        assert!(api_error.message.contains("test_record"));
    }

    #[test]
    fn test_validation_error_with_details() {
        let field_errors = json!({
            "fieldName": "fieldName is required",
            "fieldType": "fieldType is required"
        });

        let validation_error = validation_error("Validation failed", field_errors.clone());

        assert_eq!(validation_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(validation_error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(validation_error.message, Box::from("Validation failed"));
        assert_eq!(validation_error.details, Some(Box::new(field_errors)));
    }

    #[test]
    fn test_core_error_messages_name_the_entity() {
        let api_error: ApiError = CoreError::not_found("Task").into();
        assert_eq!(api_error.message, Box::from("Task not found"));

        let api_error: ApiError = CoreError::ReservedField {
            name: "Kpis".to_string(),
            kind: "Task",
        }
        .into();
        assert!(api_error.message.contains("Kpis"));
        assert!(api_error.message.contains("Task"));
    }
}
