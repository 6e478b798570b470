use axum::routing::post;
use axum::Router;

use crate::handlers::user;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// POST /analytics                -> analytics
/// POST /{id}/participant-report  -> participant_report
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analytics", post(user::analytics))
        .route("/{id}/participant-report", post(user::participant_report))
}
