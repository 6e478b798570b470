//! Handlers for user-scoped reports.

use annostat_core::types::DbId;
use annostat_core::{ComposedReport, ReportRequest};
use axum::extract::{Path, State};
use axum::Json;

use crate::error::AppResult;
use crate::requests::{ParticipantReportRequest, UserAnalyticsRequest};
use crate::response::DataResponse;
use crate::state::AppState;

use super::run_report;

/// POST /api/v1/users/analytics
pub async fn analytics(
    State(state): State<AppState>,
    Json(body): Json<UserAnalyticsRequest>,
) -> AppResult<Json<DataResponse<ComposedReport>>> {
    let query = body.into_query()?;
    run_report(&state, ReportRequest::UserProjects(query)).await
}

/// POST /api/v1/users/{id}/participant-report
pub async fn participant_report(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<ParticipantReportRequest>,
) -> AppResult<Json<DataResponse<ComposedReport>>> {
    let query = body.into_query(id)?;
    run_report(&state, ReportRequest::Participant(query)).await
}
