//! Annotation rows.

use annostat_core::records::{AnnotationRecord, AnnotationStatus, AnnotationType};
use annostat_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::decode_error;

/// A row from the `annotations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Annotation {
    pub id: DbId,
    pub task_id: DbId,
    pub annotation_type: i16,
    pub annotation_status: String,
    pub completed_by: Option<DbId>,
    pub parent_annotation_id: Option<DbId>,
    pub lead_time: Option<f64>,
    pub result: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<Annotation> for AnnotationRecord {
    type Error = sqlx::Error;

    fn try_from(row: Annotation) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            task_id: row.task_id,
            annotation_type: AnnotationType::try_from(row.annotation_type).map_err(decode_error)?,
            status: row
                .annotation_status
                .parse::<AnnotationStatus>()
                .map_err(decode_error)?,
            completed_by: row.completed_by,
            parent_annotation_id: row.parent_annotation_id,
            lead_time: row.lead_time,
            result: row.result,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
