//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope.

use serde::Serialize;
use uuid::Uuid;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Payload of the email scheduling endpoints.
#[derive(Debug, Serialize)]
pub struct ScheduledReport {
    pub job_id: Uuid,
    pub message: &'static str,
}
