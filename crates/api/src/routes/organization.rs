use axum::routing::post;
use axum::Router;

use crate::handlers::organization;
use crate::state::AppState;

/// Routes mounted at `/organizations`.
///
/// ```text
/// POST /{id}/analytics    -> analytics
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/analytics", post(organization::analytics))
}
