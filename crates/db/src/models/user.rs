//! User rows.

use annostat_core::records::{ParticipationType, UserRecord};
use annostat_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub role: i16,
    /// Unknown or missing codes render as "N/A" in reports.
    pub participation_type: Option<i16>,
    pub languages: Vec<String>,
    pub organization_id: Option<DbId>,
    pub created_at: Timestamp,
}

impl From<User> for UserRecord {
    fn from(row: User) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            role: row.role,
            participation_type: ParticipationType::from_code(row.participation_type),
            languages: row.languages,
            organization_id: row.organization_id,
        }
    }
}
