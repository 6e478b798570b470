//! End-to-end report tests against a real database.
//!
//! Requires a PostgreSQL `DATABASE_URL`.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, post_json};
use serde_json::json;
use sqlx::PgPool;

/// One workspace with a Hindi translation project and two annotated tasks.
async fn seed(pool: &PgPool) -> (i64, i64) {
    let organization: i64 =
        sqlx::query_scalar("INSERT INTO organizations (title) VALUES ('Acme') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();
    let workspace: i64 = sqlx::query_scalar(
        "INSERT INTO workspaces (organization_id, name) VALUES ($1, 'News') RETURNING id",
    )
    .bind(organization)
    .fetch_one(pool)
    .await
    .unwrap();
    let project: i64 = sqlx::query_scalar(
        "INSERT INTO projects (title, workspace_id, organization_id, project_type, tgt_language) \
         VALUES ('Headlines', $1, $2, 'ContextualTranslationEditing', 'Hindi') RETURNING id",
    )
    .bind(workspace)
    .bind(organization)
    .fetch_one(pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO tasks (project_id, task_status, data) \
         VALUES ($1, 'annotated', '{\"word_count\": 5}'), ($1, 'annotated', '{\"word_count\": 7}'), \
                ($1, 'unlabeled', '{}')",
    )
    .bind(project)
    .execute(pool)
    .await
    .unwrap();
    (organization, workspace)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_check_reports_db(pool: PgPool) {
    let response = get(build_test_app(pool), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cumulative_tasks_count_by_language(pool: PgPool) {
    let (_, workspace) = seed(&pool).await;
    let app = build_test_app(pool);

    let response = post_json(
        app,
        &format!("/api/v1/workspaces/{workspace}/cumulative-tasks-count"),
        json!({ "project_type": "ContextualTranslationEditing" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["language"], "Hindi");
    assert_eq!(json["data"][0]["cumulative_tasks_count"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn project_analytics_lists_projects(pool: PgPool) {
    let (_, workspace) = seed(&pool).await;
    let app = build_test_app(pool);

    let response = post_json(
        app,
        &format!("/api/v1/workspaces/{workspace}/project-analytics"),
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["Project Name"], "Headlines");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_organization_returns_404(pool: PgPool) {
    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/organizations/9999/analytics",
        json!({
            "from_date": "2024-01-01",
            "to_date": "2024-01-31",
            "project_type": "ContextualTranslationEditing"
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}
