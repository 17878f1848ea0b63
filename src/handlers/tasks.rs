//! # Tasks API Handlers
//!
//! Endpoints over the tenant's task records, their embedded activity logs,
//! and bulk creation across employees selected by field value.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{TenantContext, TenantHeader};
use crate::domain::{RecordId, Task, TaskLog, TaskLogPayload, TaskPayload, TaskUpdate};
use crate::error::ApiError;
use crate::repositories::{TaskRemoval, TaskRepository};
use crate::server::AppState;

/// Outcome message for task removal
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Task deleted successfully")]
    pub message: String,
}

/// Request payload for creating one task under every matching employee
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TasksByFieldRequest {
    /// Employee field the match runs against
    #[schema(example = "Department")]
    pub field: String,
    /// Value the field must equal exactly
    pub value: serde_json::Value,
    /// Task to create for each matching employee
    pub task: TaskPayload,
}

/// Result of a create-by-field run
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TasksByFieldResponse {
    /// Number of employees that received the task
    pub created: u64,
}

/// List every task of the tenant
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    params(TenantHeader),
    responses(
        (status = 200, description = "All task records", body = [Task]),
        (status = 400, description = "Missing or malformed tenant header", body = ApiError),
        (status = 404, description = "Unknown tenant", body = ApiError),
        (status = 503, description = "Tenant partition unavailable", body = ApiError)
    ),
    tag = "tasks"
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = TaskRepository::new(&state.models, &tenant).list().await?;
    Ok(Json(tasks))
}

/// Create a task for an employee
///
/// The task record is written first and then linked into the employee's
/// `Tasks` list.
#[utoipa::path(
    post,
    path = "/api/v1/employees/{id}/tasks",
    params(
        ("id" = String, Path, description = "Employee record id"),
        TenantHeader
    ),
    request_body = TaskPayload,
    responses(
        (status = 201, description = "Task created and linked", body = Task, headers(
            ("Location", description = "URL of the created task")
        )),
        (status = 400, description = "Malformed id or body", body = ApiError),
        (status = 404, description = "Employee not found", body = ApiError)
    ),
    tag = "tasks"
)]
pub async fn create_task(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(id): Path<String>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> Result<(StatusCode, [(&'static str, String); 1], Json<Task>), ApiError> {
    let employee_id = RecordId::parse(&id)?;
    let Json(payload) = payload?;
    let task = TaskRepository::new(&state.models, &tenant)
        .create_for_employee(employee_id, payload)
        .await?;

    let location = format!("/api/v1/tasks/{}", task.id);
    Ok((StatusCode::CREATED, [("Location", location)], Json(task)))
}

/// List the tasks of an employee
///
/// An employee with no tasks yields 404, matching the original surface.
#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}/tasks",
    params(
        ("id" = String, Path, description = "Employee record id"),
        TenantHeader
    ),
    responses(
        (status = 200, description = "Tasks referencing the employee", body = [Task]),
        (status = 404, description = "Employee unknown or has no tasks", body = ApiError)
    ),
    tag = "tasks"
)]
pub async fn employee_tasks(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(id): Path<String>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let employee_id = RecordId::parse(&id)?;
    let tasks = TaskRepository::new(&state.models, &tenant)
        .of_employee(employee_id)
        .await?;
    Ok(Json(tasks))
}

/// Get one task scoped to its employee
#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}/tasks/{task_id}",
    params(
        ("id" = String, Path, description = "Employee record id"),
        ("task_id" = String, Path, description = "Task record id"),
        TenantHeader
    ),
    responses(
        (status = 200, description = "Task found", body = Task),
        (status = 404, description = "Task not found for this employee", body = ApiError)
    ),
    tag = "tasks"
)]
pub async fn get_employee_task(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path((id, task_id)): Path<(String, String)>,
) -> Result<Json<Task>, ApiError> {
    let employee_id = RecordId::parse(&id)?;
    let task_id = RecordId::parse(&task_id)?;
    let task = TaskRepository::new(&state.models, &tenant)
        .get_for_employee(employee_id, task_id)
        .await?;
    Ok(Json(task))
}

/// Update a task
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{task_id}",
    params(
        ("task_id" = String, Path, description = "Task record id"),
        TenantHeader
    ),
    request_body = TaskUpdate,
    responses(
        (status = 200, description = "Updated task", body = Task),
        (status = 400, description = "Malformed id or body", body = ApiError),
        (status = 404, description = "Task not found", body = ApiError)
    ),
    tag = "tasks"
)]
pub async fn update_task(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(task_id): Path<String>,
    payload: Result<Json<TaskUpdate>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let task_id = RecordId::parse(&task_id)?;
    let Json(update) = payload?;
    let task = TaskRepository::new(&state.models, &tenant)
        .update(task_id, update)
        .await?;
    Ok(Json(task))
}

/// Delete a task owned by an employee
///
/// The employee's reference is removed first, then the task record. A task
/// the employee does not reference leaves everything untouched and reports
/// that in the message.
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{id}/tasks/{task_id}",
    params(
        ("id" = String, Path, description = "Employee record id"),
        ("task_id" = String, Path, description = "Task record id"),
        TenantHeader
    ),
    responses(
        (status = 200, description = "Removal outcome", body = MessageResponse),
        (status = 404, description = "Employee or task not found", body = ApiError)
    ),
    tag = "tasks"
)]
pub async fn delete_task(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path((id, task_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let employee_id = RecordId::parse(&id)?;
    let task_id = RecordId::parse(&task_id)?;

    let outcome = TaskRepository::new(&state.models, &tenant)
        .delete(employee_id, task_id)
        .await?;

    let message = match outcome {
        TaskRemoval::Deleted => "Task deleted successfully",
        TaskRemoval::NotLinked => "Task not associated with this employee",
    };
    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}

/// Get just a task's title
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{task_id}/title",
    params(
        ("task_id" = String, Path, description = "Task record id"),
        TenantHeader
    ),
    responses(
        (status = 200, description = "The task's title", body = String),
        (status = 404, description = "Task not found", body = ApiError)
    ),
    tag = "tasks"
)]
pub async fn task_title(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(task_id): Path<String>,
) -> Result<Json<String>, ApiError> {
    let task_id = RecordId::parse(&task_id)?;
    let title = TaskRepository::new(&state.models, &tenant)
        .title_of(task_id)
        .await?;
    Ok(Json(title))
}

/// Append a log entry to a task
///
/// The entry's `registerDate` defaults to now when the payload omits it.
/// Returns the task with the new entry in place.
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{task_id}/logs",
    params(
        ("task_id" = String, Path, description = "Task record id"),
        TenantHeader
    ),
    request_body = TaskLogPayload,
    responses(
        (status = 200, description = "Task with the appended log", body = Task),
        (status = 400, description = "Malformed id or body", body = ApiError),
        (status = 404, description = "Task not found", body = ApiError)
    ),
    tag = "tasks"
)]
pub async fn append_task_log(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(task_id): Path<String>,
    payload: Result<Json<TaskLogPayload>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let task_id = RecordId::parse(&task_id)?;
    let Json(payload) = payload?;
    let task = TaskRepository::new(&state.models, &tenant)
        .append_log(task_id, payload)
        .await?;
    Ok(Json(task))
}

/// List a task's log entries, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{task_id}/logs",
    params(
        ("task_id" = String, Path, description = "Task record id"),
        TenantHeader
    ),
    responses(
        (status = 200, description = "Log entries", body = [TaskLog]),
        (status = 404, description = "Task not found", body = ApiError)
    ),
    tag = "tasks"
)]
pub async fn task_logs(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(task_id): Path<String>,
) -> Result<Json<Vec<TaskLog>>, ApiError> {
    let task_id = RecordId::parse(&task_id)?;
    let logs = TaskRepository::new(&state.models, &tenant)
        .logs_of(task_id)
        .await?;
    Ok(Json(logs))
}

/// List the distinct field names used across a task's logs
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{task_id}/log-keys",
    params(
        ("task_id" = String, Path, description = "Task record id"),
        TenantHeader
    ),
    responses(
        (status = 200, description = "Sorted union of log field names", body = [String]),
        (status = 404, description = "Task not found", body = ApiError)
    ),
    tag = "tasks"
)]
pub async fn task_log_keys(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(task_id): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let task_id = RecordId::parse(&task_id)?;
    let keys = TaskRepository::new(&state.models, &tenant)
        .log_keys(task_id)
        .await?;
    Ok(Json(keys))
}

/// Create one task for every employee matching a field value
///
/// Employees are selected by exact match on the given field. Each match
/// gets its own task record; failures on individual employees are skipped.
#[utoipa::path(
    post,
    path = "/api/v1/tasks/by-field",
    params(TenantHeader),
    request_body = TasksByFieldRequest,
    responses(
        (status = 200, description = "Number of employees that received the task", body = TasksByFieldResponse),
        (status = 400, description = "Invalid request body", body = ApiError),
        (status = 404, description = "No employee matched", body = ApiError)
    ),
    tag = "tasks"
)]
pub async fn create_tasks_by_field(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    payload: Result<Json<TasksByFieldRequest>, JsonRejection>,
) -> Result<Json<TasksByFieldResponse>, ApiError> {
    let Json(payload) = payload?;
    let created = TaskRepository::new(&state.models, &tenant)
        .create_by_field(&payload.field, &payload.value, payload.task)
        .await?;
    Ok(Json(TasksByFieldResponse { created }))
}
