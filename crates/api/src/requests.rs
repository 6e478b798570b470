//! Request bodies of the report endpoints.
//!
//! Each body is checked with `validator` and converted into a core query by
//! `into_query`, which runs every date, enum and code parser before the
//! handler touches the database.

use std::collections::BTreeSet;

use annostat_core::capability::ProjectFamily;
use annostat_core::period::{parse_date, Granularity};
use annostat_core::records::ProjectStage;
use annostat_core::reports::params::parse_participation_types;
use annostat_core::reports::{
    AllTypesQuery, DateRange, LanguageQuery, OrganizationQuery, ParticipantQuery, PeriodicQuery,
    ProjectAnalyticsQuery, UserProjectsQuery, WorkspaceUserQuery,
};
use annostat_core::stage::Stage;
use annostat_core::types::{Date, DbId};
use annostat_core::CoreError;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::query::AllTypesParams;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Both dates or neither.
fn optional_range(from: Option<&str>, to: Option<&str>) -> Result<Option<DateRange>, CoreError> {
    match (from, to) {
        (None, None) => Ok(None),
        (Some(from), Some(to)) => DateRange::parse(from, to).map(Some),
        _ => Err(CoreError::Validation(
            "Both 'From' and 'To' dates are required".into(),
        )),
    }
}

fn optional_date(value: Option<&str>) -> Result<Option<Date>, CoreError> {
    value.map(parse_date).transpose()
}

fn progress_stage(code: Option<i16>) -> Result<Option<ProjectStage>, CoreError> {
    code.map(ProjectStage::try_from).transpose()
}

/// Blank strings mean "no filter".
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Email variants need someone to send to.
pub fn require_recipient(user_id: Option<DbId>) -> AppResult<DbId> {
    user_id.ok_or_else(|| AppError::BadRequest("user_id is required to email a report".into()))
}

// ---------------------------------------------------------------------------
// Workspace reports
// ---------------------------------------------------------------------------

/// Body of `POST /workspaces/{id}/user-analytics` and its email variant.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct WorkspaceUserAnalyticsRequest {
    #[validate(length(min = 1))]
    pub project_type: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub tgt_language: Option<String>,
    #[serde(default)]
    pub reviewer_reports: bool,
    #[serde(default)]
    pub supercheck_reports: bool,
    #[validate(range(min = 1, max = 3))]
    pub project_progress_stage: Option<i16>,
    pub participation_types: Option<Vec<i16>>,
    /// Recipient of the email variant.
    pub user_id: Option<DbId>,
}

impl WorkspaceUserAnalyticsRequest {
    pub fn into_query(self, workspace_id: DbId) -> AppResult<WorkspaceUserQuery> {
        self.validate()?;
        let participation_types = self
            .participation_types
            .as_deref()
            .map(parse_participation_types)
            .transpose()?;
        Ok(WorkspaceUserQuery {
            workspace_id,
            stage: Stage::from_report_flags(self.reviewer_reports, self.supercheck_reports),
            range: optional_range(self.from_date.as_deref(), self.to_date.as_deref())?,
            progress_stage: progress_stage(self.project_progress_stage)?,
            project_type: non_blank(self.project_type),
            tgt_language: non_blank(self.tgt_language),
            participation_types,
        })
    }
}

/// Body of `POST /workspaces/{id}/project-analytics` and its email variant.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectAnalyticsRequest {
    pub project_type: Option<String>,
    pub tgt_language: Option<String>,
    pub user_id: Option<DbId>,
}

impl ProjectAnalyticsRequest {
    pub fn into_query(self, workspace_id: DbId) -> ProjectAnalyticsQuery {
        ProjectAnalyticsQuery {
            workspace_id,
            project_type: non_blank(self.project_type),
            tgt_language: non_blank(self.tgt_language),
        }
    }
}

/// Body of `POST /workspaces/{id}/send-user-analytics`: the annotator
/// report for selected participation types, always emailed.
#[derive(Debug, Deserialize, Validate)]
pub struct SendUserAnalyticsRequest {
    pub user_id: DbId,
    #[validate(length(min = 1))]
    pub participation_types: Vec<i16>,
    pub from_date: String,
    pub to_date: String,
    pub project_type: Option<String>,
}

impl SendUserAnalyticsRequest {
    pub fn into_query(self, workspace_id: DbId) -> AppResult<WorkspaceUserQuery> {
        self.validate()?;
        Ok(WorkspaceUserQuery {
            workspace_id,
            stage: Stage::Annotation,
            project_type: non_blank(self.project_type),
            progress_stage: None,
            tgt_language: None,
            participation_types: Some(parse_participation_types(&self.participation_types)?),
            range: Some(DateRange::parse(&self.from_date, &self.to_date)?),
        })
    }
}

/// Body of `POST /workspaces/{id}/cumulative-tasks-count`.
#[derive(Debug, Deserialize, Validate)]
pub struct CumulativeRequest {
    #[validate(length(min = 1))]
    pub project_type: String,
    #[serde(default)]
    pub reviewer_reports: bool,
    #[serde(default)]
    pub supercheck_reports: bool,
}

impl CumulativeRequest {
    pub fn into_query(self, workspace_id: DbId, metainfo: bool) -> AppResult<LanguageQuery> {
        self.validate()?;
        Ok(LanguageQuery {
            workspace_id,
            project_type: self.project_type.trim().to_owned(),
            stage: Stage::from_report_flags(self.reviewer_reports, self.supercheck_reports),
            metainfo,
        })
    }
}

impl AllTypesParams {
    pub fn into_query(self, workspace_id: DbId) -> AllTypesQuery {
        AllTypesQuery {
            workspace_id,
            project_types: non_blank(self.project_type).into_iter().collect(),
            metainfo: self.metainfo,
        }
    }
}

/// Body of `POST /workspaces/{id}/periodical-tasks-count`.
#[derive(Debug, Deserialize, Validate)]
pub struct PeriodicalRequest {
    #[validate(length(min = 1))]
    pub project_type: String,
    /// `weekly`, `monthly` or `yearly`.
    pub periodical_type: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub reviewer_reports: bool,
    #[serde(default)]
    pub supercheck_reports: bool,
}

impl PeriodicalRequest {
    pub fn into_query(
        self,
        workspace_id: DbId,
        metainfo: bool,
        today: Date,
    ) -> AppResult<PeriodicQuery> {
        self.validate()?;
        let granularity: Granularity = self.periodical_type.trim().parse()?;
        let start = optional_date(self.start_date.as_deref())?;
        let end = optional_date(self.end_date.as_deref())?;
        if let (Some(start), Some(end)) = (start, end) {
            DateRange::new(start, end)?;
        }
        Ok(PeriodicQuery {
            workspace_id,
            project_type: self.project_type.trim().to_owned(),
            stage: Stage::from_report_flags(self.reviewer_reports, self.supercheck_reports),
            granularity,
            start,
            end,
            metainfo,
            today,
        })
    }
}

// ---------------------------------------------------------------------------
// Organization and user reports
// ---------------------------------------------------------------------------

/// Body of `POST /organizations/{id}/analytics`.
#[derive(Debug, Deserialize, Validate)]
pub struct OrganizationAnalyticsRequest {
    pub from_date: String,
    pub to_date: String,
    #[validate(length(min = 1))]
    pub project_type: String,
    pub tgt_language: Option<String>,
    pub sort_by: Option<String>,
    #[serde(default)]
    pub descending: bool,
}

impl OrganizationAnalyticsRequest {
    pub fn into_query(self, organization_id: DbId) -> AppResult<OrganizationQuery> {
        self.validate()?;
        Ok(OrganizationQuery {
            organization_id,
            range: DateRange::parse(&self.from_date, &self.to_date)?,
            project_type: self.project_type.trim().to_owned(),
            tgt_language: non_blank(self.tgt_language),
            sort_by: non_blank(self.sort_by),
            descending: self.descending,
        })
    }
}

/// Body of `POST /users/analytics`.
#[derive(Debug, Deserialize, Validate)]
pub struct UserAnalyticsRequest {
    pub user_id: DbId,
    #[validate(length(min = 1))]
    pub project_type: String,
    pub start_date: String,
    pub end_date: String,
}

impl UserAnalyticsRequest {
    pub fn into_query(self) -> AppResult<UserProjectsQuery> {
        self.validate()?;
        Ok(UserProjectsQuery {
            user_id: self.user_id,
            project_type: self.project_type.trim().to_owned(),
            range: DateRange::parse(&self.start_date, &self.end_date)?,
        })
    }
}

/// Body of `POST /users/{id}/participant-report`.
#[derive(Debug, Deserialize, Validate)]
pub struct ParticipantReportRequest {
    #[validate(length(min = 1))]
    pub project_ids: Vec<DbId>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    #[serde(default)]
    pub reviewer_reports: bool,
    #[serde(default)]
    pub supercheck_reports: bool,
    #[validate(range(min = 1, max = 3))]
    pub project_progress_stage: Option<i16>,
    /// Selects the family metrics; omitted means counts only.
    pub project_type: Option<String>,
}

impl ParticipantReportRequest {
    pub fn into_query(self, user_id: DbId) -> AppResult<ParticipantQuery> {
        self.validate()?;
        Ok(ParticipantQuery {
            stage: Stage::from_report_flags(self.reviewer_reports, self.supercheck_reports),
            user_id,
            project_ids: self.project_ids.into_iter().collect::<BTreeSet<_>>(),
            range: optional_range(self.from_date.as_deref(), self.to_date.as_deref())?,
            progress_stage: progress_stage(self.project_progress_stage)?,
            family: non_blank(self.project_type).map(|t| ProjectFamily::of(&t)),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
