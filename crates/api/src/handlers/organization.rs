//! Handlers for organization-scoped reports.

use annostat_core::types::DbId;
use annostat_core::{ComposedReport, ReportRequest};
use axum::extract::{Path, State};
use axum::Json;

use crate::error::AppResult;
use crate::requests::OrganizationAnalyticsRequest;
use crate::response::DataResponse;
use crate::state::AppState;

use super::run_report;

/// POST /api/v1/organizations/{id}/analytics
pub async fn analytics(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<OrganizationAnalyticsRequest>,
) -> AppResult<Json<DataResponse<ComposedReport>>> {
    let query = body.into_query(id)?;
    run_report(&state, ReportRequest::Organization(query)).await
}
