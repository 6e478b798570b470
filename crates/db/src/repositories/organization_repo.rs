//! Repository for the `organizations` table.

use annostat_core::types::DbId;
use sqlx::PgConnection;

use crate::models::organization::Organization;

const COLUMNS: &str = "id, title, created_at";

/// Provides read access to organizations.
pub struct OrganizationRepo;

impl OrganizationRepo {
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Organization>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM organizations WHERE id = $1");
        sqlx::query_as::<_, Organization>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Fetch every organization in `ids`, ordered by id.
    pub async fn list_by_ids(
        conn: &mut PgConnection,
        ids: &[DbId],
    ) -> Result<Vec<Organization>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM organizations WHERE id = ANY($1) ORDER BY id");
        sqlx::query_as::<_, Organization>(&query)
            .bind(ids)
            .fetch_all(conn)
            .await
    }
}
