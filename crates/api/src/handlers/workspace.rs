//! Handlers for workspace-scoped reports.

use annostat_core::types::DbId;
use annostat_core::{ComposedReport, ReportRequest};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::error::AppResult;
use crate::query::{AllTypesParams, MetainfoParams};
use crate::requests::{
    require_recipient, CumulativeRequest, PeriodicalRequest, ProjectAnalyticsRequest,
    SendUserAnalyticsRequest, WorkspaceUserAnalyticsRequest,
};
use crate::response::{DataResponse, ScheduledReport};
use crate::state::AppState;

use super::{run_report, schedule};

type ReportResponse = AppResult<Json<DataResponse<ComposedReport>>>;
type ScheduledResponse = AppResult<(StatusCode, Json<DataResponse<ScheduledReport>>)>;

/// POST /api/v1/workspaces/{id}/user-analytics
pub async fn user_analytics(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<WorkspaceUserAnalyticsRequest>,
) -> ReportResponse {
    let query = body.into_query(id)?;
    run_report(&state, ReportRequest::WorkspaceUsers(query)).await
}

/// POST /api/v1/workspaces/{id}/user-analytics/email
pub async fn email_user_analytics(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<WorkspaceUserAnalyticsRequest>,
) -> ScheduledResponse {
    let recipient = require_recipient(body.user_id)?;
    let query = body.into_query(id)?;
    schedule(&state, recipient, ReportRequest::WorkspaceUsers(query))
}

/// POST /api/v1/workspaces/{id}/project-analytics
pub async fn project_analytics(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<ProjectAnalyticsRequest>,
) -> ReportResponse {
    run_report(&state, ReportRequest::WorkspaceProjects(body.into_query(id))).await
}

/// POST /api/v1/workspaces/{id}/project-analytics/email
pub async fn email_project_analytics(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<ProjectAnalyticsRequest>,
) -> ScheduledResponse {
    let recipient = require_recipient(body.user_id)?;
    schedule(&state, recipient, ReportRequest::WorkspaceProjects(body.into_query(id)))
}

/// POST /api/v1/workspaces/{id}/send-user-analytics
pub async fn send_user_analytics(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<SendUserAnalyticsRequest>,
) -> ScheduledResponse {
    let recipient = body.user_id;
    let query = body.into_query(id)?;
    schedule(&state, recipient, ReportRequest::WorkspaceUsers(query))
}

/// POST /api/v1/workspaces/{id}/cumulative-tasks-count
pub async fn cumulative_tasks_count(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<MetainfoParams>,
    Json(body): Json<CumulativeRequest>,
) -> ReportResponse {
    let query = body.into_query(id, params.metainfo)?;
    run_report(&state, ReportRequest::CumulativeByLanguage(query)).await
}

/// GET /api/v1/workspaces/{id}/cumulative-tasks-count-all
pub async fn cumulative_tasks_count_all(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<AllTypesParams>,
) -> ReportResponse {
    run_report(&state, ReportRequest::CumulativeAllTypes(params.into_query(id))).await
}

/// POST /api/v1/workspaces/{id}/periodical-tasks-count
pub async fn periodical_tasks_count(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<MetainfoParams>,
    Json(body): Json<PeriodicalRequest>,
) -> ReportResponse {
    let today = Utc::now().date_naive();
    let query = body.into_query(id, params.metainfo, today)?;
    run_report(&state, ReportRequest::Periodical(query)).await
}
