//! Project rows and their stage memberships.

use annostat_core::records::{ProjectRecord, ProjectStage};
use annostat_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::decode_error;

/// Membership role codes in `project_members.role`.
pub const MEMBER_ANNOTATOR: i16 = 1;
pub const MEMBER_REVIEWER: i16 = 2;
pub const MEMBER_SUPER_CHECKER: i16 = 3;

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub title: String,
    pub workspace_id: DbId,
    pub organization_id: DbId,
    pub project_type: String,
    pub project_stage: i16,
    pub tgt_language: Option<String>,
    pub revision_loop_count: i32,
    pub created_at: Timestamp,
}

/// A row from the `project_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectMember {
    pub project_id: DbId,
    pub user_id: DbId,
    pub role: i16,
}

impl Project {
    /// Converts into a core record, attaching members that belong to this
    /// project. Members with an unknown role are ignored.
    pub fn into_record(self, members: &[ProjectMember]) -> Result<ProjectRecord, sqlx::Error> {
        let project_stage = ProjectStage::try_from(self.project_stage).map_err(decode_error)?;
        let with_role = |role: i16| -> Vec<DbId> {
            members
                .iter()
                .filter(|m| m.project_id == self.id && m.role == role)
                .map(|m| m.user_id)
                .collect()
        };

        Ok(ProjectRecord {
            annotators: with_role(MEMBER_ANNOTATOR),
            reviewers: with_role(MEMBER_REVIEWER),
            super_checkers: with_role(MEMBER_SUPER_CHECKER),
            id: self.id,
            title: self.title,
            workspace_id: self.workspace_id,
            organization_id: self.organization_id,
            project_type: self.project_type,
            project_stage,
            tgt_language: self.tgt_language,
            revision_loop_limit: self.revision_loop_count,
        })
    }
}
