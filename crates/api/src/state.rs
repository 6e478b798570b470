use std::sync::Arc;

use annostat_events::ReportDispatcher;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: annostat_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Producer handle of the report email queue.
    pub dispatcher: ReportDispatcher,
}
