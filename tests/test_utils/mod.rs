//! Test utilities for exercising the HTTP surface.
//!
//! This module builds fully wired applications over an in-memory tenant
//! catalog, backed by either the in-process store or SQL partitions under
//! a temporary directory.

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

use workboard::auth::TENANT_HEADER;
use workboard::config::{AppConfig, StorageBackend};
use workboard::domain::TenantId;
use workboard::server::{AppState, create_app};
use workboard::storage::{DocumentStore, MemoryStore, SqlStore};
use workboard::tenancy::{ModelRegistry, PartitionRegistry, TenantCatalog};

/// Sets up an in-memory SQLite catalog with all migrations applied.
pub async fn setup_catalog() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Registers the given tenants in the catalog.
pub async fn register_tenants(db: &DatabaseConnection, tenants: &[&str]) -> Result<()> {
    let catalog = TenantCatalog::new(db);
    for slug in tenants {
        catalog.create(&TenantId::new(slug)?, None).await?;
    }
    Ok(())
}

fn app_with_store(
    db: DatabaseConnection,
    store: Arc<dyn DocumentStore>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        config: Arc::new(config),
        db,
        models: Arc::new(ModelRegistry::new(Arc::new(PartitionRegistry::new(store)))),
    };
    create_app(state)
}

/// Builds an application over the in-process store with the given tenants
/// registered.
#[allow(dead_code)]
pub async fn memory_app(tenants: &[&str]) -> Result<Router> {
    let db = setup_catalog().await?;
    register_tenants(&db, tenants).await?;
    Ok(app_with_store(
        db,
        Arc::new(MemoryStore::new()),
        AppConfig::default(),
    ))
}

/// Builds an application whose tenant partitions are SQLite files under
/// `dir`, one database per tenant.
#[allow(dead_code)]
pub async fn sql_app(dir: &Path, tenants: &[&str]) -> Result<Router> {
    let db = setup_catalog().await?;
    register_tenants(&db, tenants).await?;

    let config = AppConfig {
        partition_url_template: format!("sqlite://{}/{{tenant}}.db?mode=rwc", dir.display()),
        storage_backend: StorageBackend::Sql,
        ..Default::default()
    };
    let store = Arc::new(SqlStore::new(&config));
    Ok(app_with_store(db, store, config))
}

/// Sends a request and decodes the JSON body, if any.
pub async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

/// GET under a tenant.
#[allow(dead_code)]
pub async fn get(app: &Router, tenant: &str, uri: &str) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .uri(uri)
        .header(TENANT_HEADER, tenant)
        .body(Body::empty())?;
    send(app, request).await
}

/// POST a JSON body under a tenant.
#[allow(dead_code)]
pub async fn post_json(
    app: &Router,
    tenant: &str,
    uri: &str,
    body: Value,
) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(TENANT_HEADER, tenant)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?;
    send(app, request).await
}

/// PUT a JSON body under a tenant.
#[allow(dead_code)]
pub async fn put_json(
    app: &Router,
    tenant: &str,
    uri: &str,
    body: Value,
) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .method("PUT")
        .uri(uri)
        .header(TENANT_HEADER, tenant)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?;
    send(app, request).await
}

/// DELETE under a tenant.
#[allow(dead_code)]
pub async fn delete(app: &Router, tenant: &str, uri: &str) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(TENANT_HEADER, tenant)
        .body(Body::empty())?;
    send(app, request).await
}

/// A minimal valid task body.
#[allow(dead_code)]
pub fn task_payload(title: &str) -> Value {
    serde_json::json!({
        "Title": title,
        "Priority": 1,
        "Start_Date": "2026-03-02T00:00:00Z",
        "End_Date": "2026-03-31T00:00:00Z",
        "Concurrence": false,
        "State": "open"
    })
}

/// Creates an employee and returns its id.
#[allow(dead_code)]
pub async fn create_employee(
    app: &Router,
    tenant: &str,
    name: &str,
    department: &str,
) -> Result<String> {
    let (status, body) = post_json(
        app,
        tenant,
        "/api/v1/employees",
        serde_json::json!({
            "Name": name,
            "Department": department,
            "Work_position": "Account Executive",
            "Role": 2
        }),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "employee create failed: {body}");
    Ok(body["id"].as_str().unwrap_or_default().to_string())
}

/// Creates a task under the employee and returns its id.
#[allow(dead_code)]
pub async fn create_task(
    app: &Router,
    tenant: &str,
    employee_id: &str,
    title: &str,
) -> Result<String> {
    let (status, body) = post_json(
        app,
        tenant,
        &format!("/api/v1/employees/{employee_id}/tasks"),
        task_payload(title),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "task create failed: {body}");
    Ok(body["id"].as_str().unwrap_or_default().to_string())
}
