//! Repository for the `annotations` table.

use annostat_core::types::DbId;
use sqlx::PgConnection;

use crate::models::annotation::Annotation;

const COLUMNS: &str = "id, task_id, annotation_type, annotation_status, completed_by, \
                       parent_annotation_id, lead_time, result, created_at, updated_at";

/// Provides read access to annotations.
pub struct AnnotationRepo;

impl AnnotationRepo {
    /// Every annotation of the given tasks, ordered by id.
    pub async fn list_by_tasks(
        conn: &mut PgConnection,
        task_ids: &[DbId],
    ) -> Result<Vec<Annotation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM annotations WHERE task_id = ANY($1) ORDER BY id");
        sqlx::query_as::<_, Annotation>(&query)
            .bind(task_ids)
            .fetch_all(conn)
            .await
    }
}
