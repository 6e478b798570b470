//! Route definitions for workspace reports.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::workspace;
use crate::state::AppState;

/// Routes mounted at `/workspaces`.
///
/// ```text
/// POST /{id}/user-analytics                -> user_analytics
/// POST /{id}/user-analytics/email          -> email_user_analytics
/// POST /{id}/project-analytics             -> project_analytics
/// POST /{id}/project-analytics/email       -> email_project_analytics
/// POST /{id}/send-user-analytics           -> send_user_analytics
/// POST /{id}/cumulative-tasks-count        -> cumulative_tasks_count
/// GET  /{id}/cumulative-tasks-count-all    -> cumulative_tasks_count_all
/// POST /{id}/periodical-tasks-count        -> periodical_tasks_count
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/user-analytics", post(workspace::user_analytics))
        .route(
            "/{id}/user-analytics/email",
            post(workspace::email_user_analytics),
        )
        .route("/{id}/project-analytics", post(workspace::project_analytics))
        .route(
            "/{id}/project-analytics/email",
            post(workspace::email_project_analytics),
        )
        .route(
            "/{id}/send-user-analytics",
            post(workspace::send_user_analytics),
        )
        .route(
            "/{id}/cumulative-tasks-count",
            post(workspace::cumulative_tasks_count),
        )
        .route(
            "/{id}/cumulative-tasks-count-all",
            get(workspace::cumulative_tasks_count_all),
        )
        .route(
            "/{id}/periodical-tasks-count",
            post(workspace::periodical_tasks_count),
        )
}
