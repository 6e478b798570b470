//! Organization rows.

use annostat_core::records::OrganizationRecord;
use annostat_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `organizations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Organization {
    pub id: DbId,
    pub title: String,
    pub created_at: Timestamp,
}

impl From<Organization> for OrganizationRecord {
    fn from(row: Organization) -> Self {
        Self {
            id: row.id,
            title: row.title,
        }
    }
}
