//! End-to-end tests for KPI attachment and evaluation.

use anyhow::Result;
use axum::{Router, http::StatusCode};
use serde_json::json;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{create_employee, create_task, get, memory_app, post_json, sql_app};

async fn create_kpi(app: &Router, tenant: &str, task_id: &str, time_unit: i64) -> Result<String> {
    let (status, body) = post_json(
        app,
        tenant,
        &format!("/api/v1/tasks/{task_id}/kpis"),
        json!({
            "Title": "Distinct customers",
            "Target": 10.0,
            "Time_Unit": time_unit,
            "Field_To_Be_Evaluated": "customer"
        }),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "kpi create failed: {body}");
    Ok(body["id"].as_str().unwrap_or_default().to_string())
}

async fn append_log(app: &Router, tenant: &str, task_id: &str, date: &str, customer: &str) -> Result<()> {
    let (status, body) = post_json(
        app,
        tenant,
        &format!("/api/v1/tasks/{task_id}/logs"),
        json!({"registerDate": date, "customer": customer}),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "log append failed: {body}");
    Ok(())
}

#[tokio::test]
async fn evaluation_scores_distinct_values_against_the_prorated_target() -> Result<()> {
    let app = memory_app(&["acme"]).await?;
    let employee_id = create_employee(&app, "acme", "Ana", "Sales").await?;
    let task_id = create_task(&app, "acme", &employee_id, "Q1 outreach").await?;
    let kpi_id = create_kpi(&app, "acme", &task_id, 1).await?;

    for customer in ["ACME", "Globex", "Initech", "ACME"] {
        append_log(&app, "acme", &task_id, "2026-03-03T09:00:00Z", customer).await?;
    }

    let (status, body) = post_json(
        &app,
        "acme",
        &format!("/api/v1/tasks/{task_id}/kpis/{kpi_id}/evaluation"),
        json!({
            "startDate": "2026-03-02T00:00:00Z",
            "endDate": "2026-03-06T23:59:59Z"
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    // Five weekdays at a one-day unit against a target of 10.
    assert_eq!(body["daysConsidered"], 5);
    assert_eq!(body["targetSales"], 50.0);
    // Four values, three of them distinct.
    assert_eq!(body["totalCount"], 4);
    assert_eq!(body["kpiPercentage"], 6.0);
    assert_eq!(body["values"].as_array().expect("array").len(), 4);
    Ok(())
}

#[tokio::test]
async fn excluded_weekdays_shrink_the_window_and_drop_entries() -> Result<()> {
    let app = memory_app(&["acme"]).await?;
    let employee_id = create_employee(&app, "acme", "Ana", "Sales").await?;
    let task_id = create_task(&app, "acme", &employee_id, "Q1 outreach").await?;
    let kpi_id = create_kpi(&app, "acme", &task_id, 1).await?;

    // 2026-03-02 is a Monday; 2026-03-07 a Saturday.
    append_log(&app, "acme", &task_id, "2026-03-02T09:00:00Z", "ACME").await?;
    append_log(&app, "acme", &task_id, "2026-03-07T09:00:00Z", "Globex").await?;

    let (status, body) = post_json(
        &app,
        "acme",
        &format!("/api/v1/tasks/{task_id}/kpis/{kpi_id}/evaluation"),
        json!({
            "startDate": "2026-03-02T00:00:00Z",
            "endDate": "2026-03-08T23:59:59Z",
            "excludedDays": ["Saturday", "Sunday"]
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["daysConsidered"], 5);
    assert_eq!(body["values"], json!(["ACME"]));
    Ok(())
}

#[tokio::test]
async fn time_unit_prorates_the_target() -> Result<()> {
    let app = memory_app(&["acme"]).await?;
    let employee_id = create_employee(&app, "acme", "Ana", "Sales").await?;
    let task_id = create_task(&app, "acme", &employee_id, "Q1 outreach").await?;
    let kpi_id = create_kpi(&app, "acme", &task_id, 5).await?;

    append_log(&app, "acme", &task_id, "2026-03-03T09:00:00Z", "ACME").await?;

    let (_, body) = post_json(
        &app,
        "acme",
        &format!("/api/v1/tasks/{task_id}/kpis/{kpi_id}/evaluation"),
        json!({
            "startDate": "2026-03-02T00:00:00Z",
            "endDate": "2026-03-06T23:59:59Z"
        }),
    )
    .await?;

    // Five days at a five-day unit leaves the target at 10.
    assert_eq!(body["targetSales"], 10.0);
    assert_eq!(body["kpiPercentage"], 10.0);
    Ok(())
}

#[tokio::test]
async fn kpis_are_listed_in_reference_order() -> Result<()> {
    let app = memory_app(&["acme"]).await?;
    let employee_id = create_employee(&app, "acme", "Ana", "Sales").await?;
    let task_id = create_task(&app, "acme", &employee_id, "Q1 outreach").await?;

    let first = create_kpi(&app, "acme", &task_id, 1).await?;
    let second = create_kpi(&app, "acme", &task_id, 2).await?;

    let (status, kpis) = get(&app, "acme", &format!("/api/v1/tasks/{task_id}/kpis")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kpis[0]["id"], json!(first));
    assert_eq!(kpis[1]["id"], json!(second));

    let (status, kpi) = get(&app, "acme", &format!("/api/v1/kpis/{first}")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kpi["taskId"], json!(task_id));
    Ok(())
}

#[tokio::test]
async fn evaluation_round_trips_through_the_sql_store() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let app = sql_app(dir.path(), &["acme"]).await?;

    let employee_id = create_employee(&app, "acme", "Ana", "Sales").await?;
    let task_id = create_task(&app, "acme", &employee_id, "Q1 outreach").await?;
    let kpi_id = create_kpi(&app, "acme", &task_id, 1).await?;
    append_log(&app, "acme", &task_id, "2026-03-03T09:00:00Z", "ACME").await?;
    append_log(&app, "acme", &task_id, "2026-03-04T09:00:00Z", "Globex").await?;

    let window = json!({
        "startDate": "2026-03-02T00:00:00Z",
        "endDate": "2026-03-06T23:59:59Z"
    });
    let uri = format!("/api/v1/tasks/{task_id}/kpis/{kpi_id}/evaluation");

    let (status, first) = post_json(&app, "acme", &uri, window.clone()).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["totalCount"], 2);
    assert_eq!(first["kpiPercentage"], 4.0);

    // Evaluating is read-only: a second run returns the same result.
    let (_, second) = post_json(&app, "acme", &uri, window).await?;
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn out_of_range_time_units_are_rejected() -> Result<()> {
    let app = memory_app(&["acme"]).await?;
    let employee_id = create_employee(&app, "acme", "Ana", "Sales").await?;
    let task_id = create_task(&app, "acme", &employee_id, "Q1 outreach").await?;

    let (status, body) = post_json(
        &app,
        "acme",
        &format!("/api/v1/tasks/{task_id}/kpis"),
        json!({
            "Title": "Distinct customers",
            "Target": 10.0,
            "Time_Unit": 6,
            "Field_To_Be_Evaluated": "customer"
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_RANGE");
    Ok(())
}
