//! Repository for the `tasks` and `task_annotation_users` tables.

use annostat_core::types::DbId;
use sqlx::PgConnection;

use crate::models::task::{Task, TaskAnnotationUser};

const COLUMNS: &str = "id, project_id, task_status, data, review_user_id, super_check_user_id, \
                       correct_annotation_id, revision_loop_count";

/// Provides read access to tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Every task of the given projects, ordered by id.
    pub async fn list_by_projects(
        conn: &mut PgConnection,
        project_ids: &[DbId],
    ) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE project_id = ANY($1) ORDER BY id");
        sqlx::query_as::<_, Task>(&query)
            .bind(project_ids)
            .fetch_all(conn)
            .await
    }

    /// Annotator assignments for the given tasks.
    pub async fn list_annotation_users(
        conn: &mut PgConnection,
        task_ids: &[DbId],
    ) -> Result<Vec<TaskAnnotationUser>, sqlx::Error> {
        sqlx::query_as::<_, TaskAnnotationUser>(
            "SELECT task_id, user_id FROM task_annotation_users \
             WHERE task_id = ANY($1) \
             ORDER BY task_id, user_id",
        )
        .bind(task_ids)
        .fetch_all(conn)
        .await
    }
}
