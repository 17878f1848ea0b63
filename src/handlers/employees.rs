//! # Employees API Handlers
//!
//! CRUD endpoints over the requesting tenant's employee records.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};

use crate::auth::{TenantContext, TenantHeader};
use crate::domain::{Employee, EmployeePayload, EmployeeUpdate, RecordId};
use crate::error::ApiError;
use crate::repositories::EmployeeRepository;
use crate::server::AppState;

/// List every employee of the tenant
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(TenantHeader),
    responses(
        (status = 200, description = "All employee records", body = [Employee]),
        (status = 400, description = "Missing or malformed tenant header", body = ApiError),
        (status = 404, description = "Unknown tenant", body = ApiError),
        (status = 503, description = "Tenant partition unavailable", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn list_employees(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
) -> Result<Json<Vec<Employee>>, ApiError> {
    let employees = EmployeeRepository::new(&state.models, &tenant)
        .list()
        .await?;
    Ok(Json(employees))
}

/// Create an employee
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    params(TenantHeader),
    request_body = EmployeePayload,
    responses(
        (status = 201, description = "Employee created", body = Employee, headers(
            ("Location", description = "URL of the created employee")
        )),
        (status = 400, description = "Invalid request body", body = ApiError),
        (status = 404, description = "Unknown tenant", body = ApiError),
        (status = 503, description = "Tenant partition unavailable", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn create_employee(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    payload: Result<Json<EmployeePayload>, JsonRejection>,
) -> Result<(StatusCode, [(&'static str, String); 1], Json<Employee>), ApiError> {
    let Json(payload) = payload?;
    let employee = EmployeeRepository::new(&state.models, &tenant)
        .create(payload)
        .await?;

    let location = format!("/api/v1/employees/{}", employee.id);
    Ok((StatusCode::CREATED, [("Location", location)], Json(employee)))
}

/// Get an employee by id
#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}",
    params(
        ("id" = String, Path, description = "Employee record id"),
        TenantHeader
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 400, description = "Malformed record id", body = ApiError),
        (status = 404, description = "Employee not found", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn get_employee(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(id): Path<String>,
) -> Result<Json<Employee>, ApiError> {
    let id = RecordId::parse(&id)?;
    let employee = EmployeeRepository::new(&state.models, &tenant).get(id).await?;
    Ok(Json(employee))
}

/// Update an employee
///
/// Only the fields present in the body are touched; unknown fields are
/// stored verbatim.
#[utoipa::path(
    put,
    path = "/api/v1/employees/{id}",
    params(
        ("id" = String, Path, description = "Employee record id"),
        TenantHeader
    ),
    request_body = EmployeeUpdate,
    responses(
        (status = 200, description = "Updated employee", body = Employee),
        (status = 400, description = "Malformed record id or body", body = ApiError),
        (status = 404, description = "Employee not found", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn update_employee(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(id): Path<String>,
    payload: Result<Json<EmployeeUpdate>, JsonRejection>,
) -> Result<Json<Employee>, ApiError> {
    let id = RecordId::parse(&id)?;
    let Json(update) = payload?;
    let employee = EmployeeRepository::new(&state.models, &tenant)
        .update(id, update)
        .await?;
    Ok(Json(employee))
}

/// Delete an employee
///
/// Tasks that reference the employee are left in place.
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{id}",
    params(
        ("id" = String, Path, description = "Employee record id"),
        TenantHeader
    ),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 400, description = "Malformed record id", body = ApiError),
        (status = 404, description = "Employee not found", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn delete_employee(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = RecordId::parse(&id)?;
    EmployeeRepository::new(&state.models, &tenant)
        .delete(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get just an employee's name
#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}/name",
    params(
        ("id" = String, Path, description = "Employee record id"),
        TenantHeader
    ),
    responses(
        (status = 200, description = "The employee's name", body = String),
        (status = 404, description = "Employee not found", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn employee_name(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(id): Path<String>,
) -> Result<Json<String>, ApiError> {
    let id = RecordId::parse(&id)?;
    let name = EmployeeRepository::new(&state.models, &tenant)
        .name_of(id)
        .await?;
    Ok(Json(name))
}
