//! Report handlers.
//!
//! Every handler converts its body into a core query first, so malformed
//! input is rejected before any store access. Synchronous variants load one
//! snapshot and compute in the request; email variants only enqueue.

pub mod organization;
pub mod user;
pub mod workspace;

use annostat_core::types::DbId;
use annostat_core::{compute_report, ComposedReport, ReportRequest};
use annostat_db::snapshot::SnapshotLoader;
use annostat_events::ReportJob;
use axum::http::StatusCode;
use axum::Json;

use crate::error::AppResult;
use crate::response::{DataResponse, ScheduledReport};
use crate::state::AppState;

/// Load the request's scope and compute the report.
pub(crate) async fn run_report(
    state: &AppState,
    request: ReportRequest,
) -> AppResult<Json<DataResponse<ComposedReport>>> {
    let scope = request.scope();
    let dataset = SnapshotLoader::load(&state.pool, scope).await?;
    let report = compute_report(&dataset, &request)?;
    tracing::info!(
        kind = request.kind(),
        ?scope,
        rows = report.row_count(),
        "Report computed",
    );
    Ok(Json(DataResponse { data: report }))
}

/// Queue the report for email delivery.
pub(crate) fn schedule(
    state: &AppState,
    recipient_id: DbId,
    request: ReportRequest,
) -> AppResult<(StatusCode, Json<DataResponse<ScheduledReport>>)> {
    let job_id = state.dispatcher.enqueue(ReportJob::new(recipient_id, request))?;
    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: ScheduledReport {
                job_id,
                message: "Report will be emailed shortly",
            },
        }),
    ))
}
