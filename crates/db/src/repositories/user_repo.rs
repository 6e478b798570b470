//! Repository for the `users` table.

use annostat_core::types::DbId;
use sqlx::PgConnection;

use crate::models::user::User;

const COLUMNS: &str =
    "id, username, email, role, participation_type, languages, organization_id, created_at";

/// Provides read access to users.
pub struct UserRepo;

impl UserRepo {
    pub async fn find_by_id(conn: &mut PgConnection, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Users that belong to the organization or appear in `extra_ids`.
    ///
    /// Project members from other organizations still need a row so their
    /// work can be attributed.
    pub async fn list_for_organization(
        conn: &mut PgConnection,
        organization_id: DbId,
        extra_ids: &[DbId],
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users \
             WHERE organization_id = $1 OR id = ANY($2) \
             ORDER BY id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(organization_id)
            .bind(extra_ids)
            .fetch_all(conn)
            .await
    }

    pub async fn list_by_ids(conn: &mut PgConnection, ids: &[DbId]) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = ANY($1) ORDER BY id");
        sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(conn)
            .await
    }
}
