//! # Server Configuration
//!
//! This module contains the server setup and configuration for the
//! Workboard API: shared state, the router with its tenant middleware,
//! and the OpenAPI document.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth;
use crate::config::{AppConfig, StorageBackend};
use crate::db;
use crate::handlers;
use crate::storage::{DocumentStore, MemoryStore, SqlStore};
use crate::telemetry;
use crate::tenancy::{ModelRegistry, PartitionRegistry};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Catalog database holding the registered tenants.
    pub db: DatabaseConnection,
    /// Per-tenant model accessors over the partition registry.
    pub models: Arc<ModelRegistry>,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let tenant_scoped = Router::new()
        .route(
            "/employees",
            get(handlers::employees::list_employees).post(handlers::employees::create_employee),
        )
        .route(
            "/employees/{id}",
            get(handlers::employees::get_employee)
                .put(handlers::employees::update_employee)
                .delete(handlers::employees::delete_employee),
        )
        .route(
            "/employees/{id}/name",
            get(handlers::employees::employee_name),
        )
        .route(
            "/employees/{id}/tasks",
            get(handlers::tasks::employee_tasks).post(handlers::tasks::create_task),
        )
        .route(
            "/employees/{id}/tasks/{task_id}",
            get(handlers::tasks::get_employee_task).delete(handlers::tasks::delete_task),
        )
        .route("/tasks", get(handlers::tasks::list_tasks))
        .route(
            "/tasks/by-field",
            post(handlers::tasks::create_tasks_by_field),
        )
        .route("/tasks/{task_id}", put(handlers::tasks::update_task))
        .route("/tasks/{task_id}/title", get(handlers::tasks::task_title))
        .route(
            "/tasks/{task_id}/logs",
            get(handlers::tasks::task_logs).post(handlers::tasks::append_task_log),
        )
        .route(
            "/tasks/{task_id}/log-keys",
            get(handlers::tasks::task_log_keys),
        )
        .route(
            "/tasks/{task_id}/kpis",
            get(handlers::kpis::task_kpis).post(handlers::kpis::create_kpi),
        )
        .route(
            "/tasks/{task_id}/kpis/{kpi_id}/evaluation",
            post(handlers::kpis::evaluate_kpi),
        )
        .route("/kpis", get(handlers::kpis::list_kpis))
        .route("/kpis/{kpi_id}", get(handlers::kpis::get_kpi))
        .route("/schema/{kind}/fields", post(handlers::schema::add_field))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::tenant_middleware,
        ));

    let api = Router::new()
        .route(
            "/tenants",
            get(handlers::tenants::list_tenants).post(handlers::tenants::create_tenant),
        )
        .route("/tenants/{id}", get(handlers::tenants::get_tenant))
        .merge(tenant_scoped);

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .nest("/api/v1", api)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(telemetry::trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Builds the document store the partition registry opens tenants through
fn build_store(config: &AppConfig) -> Arc<dyn DocumentStore> {
    match config.storage_backend {
        StorageBackend::Sql => Arc::new(SqlStore::new(config)),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    }
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let db = db::init_pool(&config).await?;
    Migrator::up(&db, None).await?;

    let store = build_store(&config);
    let models = Arc::new(ModelRegistry::new(Arc::new(PartitionRegistry::new(store))));

    let state = AppState {
        config: Arc::new(config),
        db,
        models,
    };
    let app = create_app(state.clone());

    // Resolve the configured bind address
    let addr = state
        .config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, profile = %state.config.profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::tenants::create_tenant,
        crate::handlers::tenants::list_tenants,
        crate::handlers::tenants::get_tenant,
        crate::handlers::employees::list_employees,
        crate::handlers::employees::create_employee,
        crate::handlers::employees::get_employee,
        crate::handlers::employees::update_employee,
        crate::handlers::employees::delete_employee,
        crate::handlers::employees::employee_name,
        crate::handlers::tasks::list_tasks,
        crate::handlers::tasks::create_task,
        crate::handlers::tasks::employee_tasks,
        crate::handlers::tasks::get_employee_task,
        crate::handlers::tasks::update_task,
        crate::handlers::tasks::delete_task,
        crate::handlers::tasks::task_title,
        crate::handlers::tasks::append_task_log,
        crate::handlers::tasks::task_logs,
        crate::handlers::tasks::task_log_keys,
        crate::handlers::tasks::create_tasks_by_field,
        crate::handlers::kpis::list_kpis,
        crate::handlers::kpis::create_kpi,
        crate::handlers::kpis::task_kpis,
        crate::handlers::kpis::get_kpi,
        crate::handlers::kpis::evaluate_kpi,
        crate::handlers::schema::add_field,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::domain::Employee,
            crate::domain::EmployeePayload,
            crate::domain::EmployeeUpdate,
            crate::domain::Task,
            crate::domain::TaskLog,
            crate::domain::TaskLogPayload,
            crate::domain::TaskPayload,
            crate::domain::TaskUpdate,
            crate::domain::Kpi,
            crate::domain::KpiPayload,
            crate::evaluation::Evaluation,
            crate::handlers::tenants::CreateTenantRequest,
            crate::handlers::tenants::TenantResponse,
            crate::handlers::tasks::MessageResponse,
            crate::handlers::tasks::TasksByFieldRequest,
            crate::handlers::tasks::TasksByFieldResponse,
            crate::handlers::kpis::EvaluationRequest,
            crate::handlers::schema::AddFieldRequest,
            crate::handlers::schema::AddFieldResponse,
        )
    ),
    info(
        title = "Workboard API",
        description = "Multi-tenant employee, task and KPI tracking API",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;

/// State over an in-memory catalog and store, seeded with tenant `acme`.
#[cfg(test)]
pub(crate) async fn create_test_app_state() -> AppState {
    use crate::domain::TenantId;
    use crate::tenancy::TenantCatalog;

    let db = sea_orm::Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory catalog");
    Migrator::up(&db, None)
        .await
        .expect("Failed to migrate catalog");
    TenantCatalog::new(&db)
        .create(
            &TenantId::new("acme").expect("valid tenant id"),
            Some("Acme Corp".to_string()),
        )
        .await
        .expect("Failed to seed tenant");

    let store = Arc::new(MemoryStore::new());
    AppState {
        config: Arc::new(AppConfig::default()),
        db,
        models: Arc::new(ModelRegistry::new(Arc::new(PartitionRegistry::new(store)))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/v1/employees"));
        assert!(paths.contains_key("/api/v1/tasks/{task_id}/kpis/{kpi_id}/evaluation"));
        assert!(paths.contains_key("/api/v1/schema/{kind}/fields"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_a_plain_404() {
        let state = create_test_app_state().await;
        let app = create_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/departments")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
