//! Repository for the `workspaces` table.

use annostat_core::types::DbId;
use sqlx::PgConnection;

use crate::models::workspace::Workspace;

const COLUMNS: &str = "id, organization_id, name, created_at";

/// Provides read access to workspaces.
pub struct WorkspaceRepo;

impl WorkspaceRepo {
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Workspace>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workspaces WHERE id = $1");
        sqlx::query_as::<_, Workspace>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// All workspaces of an organization, ordered by id.
    pub async fn list_by_organization(
        conn: &mut PgConnection,
        organization_id: DbId,
    ) -> Result<Vec<Workspace>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM workspaces WHERE organization_id = $1 ORDER BY id");
        sqlx::query_as::<_, Workspace>(&query)
            .bind(organization_id)
            .fetch_all(conn)
            .await
    }

    pub async fn list_by_ids(
        conn: &mut PgConnection,
        ids: &[DbId],
    ) -> Result<Vec<Workspace>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workspaces WHERE id = ANY($1) ORDER BY id");
        sqlx::query_as::<_, Workspace>(&query)
            .bind(ids)
            .fetch_all(conn)
            .await
    }
}
