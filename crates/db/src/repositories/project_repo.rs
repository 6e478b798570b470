//! Repository for the `projects` and `project_members` tables.

use annostat_core::types::DbId;
use sqlx::PgConnection;

use crate::models::project::{Project, ProjectMember};

const COLUMNS: &str = "id, title, workspace_id, organization_id, project_type, project_stage, \
                       tgt_language, revision_loop_count, created_at";

/// Provides read access to projects and their members.
pub struct ProjectRepo;

impl ProjectRepo {
    pub async fn list_by_workspace(
        conn: &mut PgConnection,
        workspace_id: DbId,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE workspace_id = $1 ORDER BY id");
        sqlx::query_as::<_, Project>(&query)
            .bind(workspace_id)
            .fetch_all(conn)
            .await
    }

    pub async fn list_by_organization(
        conn: &mut PgConnection,
        organization_id: DbId,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM projects WHERE organization_id = $1 ORDER BY id");
        sqlx::query_as::<_, Project>(&query)
            .bind(organization_id)
            .fetch_all(conn)
            .await
    }

    /// Projects the user is a member of in any role, or holds task
    /// assignments in.
    pub async fn list_for_user(
        conn: &mut PgConnection,
        user_id: DbId,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects WHERE id IN ( \
                 SELECT project_id FROM project_members WHERE user_id = $1 \
                 UNION \
                 SELECT t.project_id FROM tasks t \
                 JOIN task_annotation_users tau ON tau.task_id = t.id \
                 WHERE tau.user_id = $1 \
                 UNION \
                 SELECT project_id FROM tasks \
                 WHERE review_user_id = $1 OR super_check_user_id = $1 \
             ) ORDER BY id"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .fetch_all(conn)
            .await
    }

    /// Memberships of every project in `project_ids`.
    pub async fn list_members(
        conn: &mut PgConnection,
        project_ids: &[DbId],
    ) -> Result<Vec<ProjectMember>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            "SELECT project_id, user_id, role FROM project_members \
             WHERE project_id = ANY($1) \
             ORDER BY project_id, role, user_id",
        )
        .bind(project_ids)
        .fetch_all(conn)
        .await
    }
}
