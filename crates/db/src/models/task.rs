//! Task rows.

use annostat_core::records::{RevisionLoops, TaskRecord, TaskStatus};
use annostat_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

use super::decode_error;

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub project_id: DbId,
    pub task_status: String,
    pub data: serde_json::Value,
    pub review_user_id: Option<DbId>,
    pub super_check_user_id: Option<DbId>,
    pub correct_annotation_id: Option<DbId>,
    /// `{"review_count": n, "super_check_count": n}`.
    pub revision_loop_count: serde_json::Value,
}

/// A row from the `task_annotation_users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskAnnotationUser {
    pub task_id: DbId,
    pub user_id: DbId,
}

impl Task {
    /// Converts into a core record. A malformed loop counter reads as zero.
    pub fn into_record(self, annotation_users: Vec<DbId>) -> Result<TaskRecord, sqlx::Error> {
        let status: TaskStatus = self.task_status.parse().map_err(decode_error)?;
        let revision_loops: RevisionLoops =
            serde_json::from_value(self.revision_loop_count).unwrap_or_default();

        Ok(TaskRecord {
            id: self.id,
            project_id: self.project_id,
            status,
            data: self.data,
            annotation_users,
            review_user: self.review_user_id,
            super_check_user: self.super_check_user_id,
            correct_annotation_id: self.correct_annotation_id,
            revision_loops,
        })
    }
}
