pub mod health;
pub mod organization;
pub mod user;
pub mod workspace;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /workspaces/{id}/user-analytics                  workspace user analytics
/// /workspaces/{id}/user-analytics/email            email the same
/// /workspaces/{id}/project-analytics               workspace project analytics
/// /workspaces/{id}/project-analytics/email         email the same
/// /workspaces/{id}/send-user-analytics             email annotator report
/// /workspaces/{id}/cumulative-tasks-count          cumulative by language
/// /workspaces/{id}/cumulative-tasks-count-all      cumulative, all project types (GET)
/// /workspaces/{id}/periodical-tasks-count          periodical by language
///
/// /organizations/{id}/analytics                    organization user analytics
///
/// /users/analytics                                 user project summary
/// /users/{id}/participant-report                   one participant's stage report
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/workspaces", workspace::router())
        .nest("/organizations", organization::router())
        .nest("/users", user::router())
}
