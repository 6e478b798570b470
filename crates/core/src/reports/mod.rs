//! Report entry points.
//!
//! Every report is a pure function of a [`Dataset`] snapshot and a request.
//! [`compute_report`] dispatches a [`ReportRequest`] to the matching entry
//! point and wraps the result in a [`ComposedReport`].

pub mod language;
pub mod organization;
pub mod params;
pub mod participant;
pub mod user_projects;
pub mod workspace;

use serde::Serialize;

use crate::compose::ComposedReport;
use crate::error::CoreError;
use crate::records::Dataset;
use crate::types::DbId;

pub use language::{AllTypesQuery, LanguageMetric, LanguageQuery, PeriodicQuery};
pub use organization::OrganizationQuery;
pub use params::{DateRange, SortSpec};
pub use participant::ParticipantQuery;
pub use user_projects::UserProjectsQuery;
pub use workspace::{ProjectAnalyticsQuery, WorkspaceUserQuery};

/// The store scope a report reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ReportScope {
    Workspace(DbId),
    Organization(DbId),
    User(DbId),
}

/// A fully validated report request.
#[derive(Debug, Clone)]
pub enum ReportRequest {
    Participant(ParticipantQuery),
    WorkspaceUsers(WorkspaceUserQuery),
    WorkspaceProjects(ProjectAnalyticsQuery),
    CumulativeByLanguage(LanguageQuery),
    CumulativeAllTypes(AllTypesQuery),
    Periodical(PeriodicQuery),
    Organization(OrganizationQuery),
    UserProjects(UserProjectsQuery),
}

impl ReportRequest {
    /// Short machine name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Participant(_) => "participant",
            Self::WorkspaceUsers(_) => "workspace_users",
            Self::WorkspaceProjects(_) => "workspace_projects",
            Self::CumulativeByLanguage(_) => "cumulative_by_language",
            Self::CumulativeAllTypes(_) => "cumulative_all_types",
            Self::Periodical(_) => "periodical",
            Self::Organization(_) => "organization",
            Self::UserProjects(_) => "user_projects",
        }
    }

    pub fn scope(&self) -> ReportScope {
        match self {
            Self::Participant(q) => ReportScope::User(q.user_id),
            Self::WorkspaceUsers(q) => ReportScope::Workspace(q.workspace_id),
            Self::WorkspaceProjects(q) => ReportScope::Workspace(q.workspace_id),
            Self::CumulativeByLanguage(q) => ReportScope::Workspace(q.workspace_id),
            Self::CumulativeAllTypes(q) => ReportScope::Workspace(q.workspace_id),
            Self::Periodical(q) => ReportScope::Workspace(q.workspace_id),
            Self::Organization(q) => ReportScope::Organization(q.organization_id),
            Self::UserProjects(q) => ReportScope::User(q.user_id),
        }
    }

    /// Human-readable title used as an email subject.
    pub fn title(&self) -> String {
        match self {
            Self::Participant(q) => format!("{} report", q.stage.participant_label()),
            Self::WorkspaceUsers(q) => format!(
                "Workspace {} {} analytics",
                q.workspace_id,
                q.stage.participant_label().to_lowercase()
            ),
            Self::WorkspaceProjects(q) => format!("Workspace {} project analytics", q.workspace_id),
            Self::CumulativeByLanguage(q) => {
                format!("Workspace {} cumulative {} tasks", q.workspace_id, q.project_type)
            }
            Self::CumulativeAllTypes(q) => format!("Workspace {} cumulative tasks", q.workspace_id),
            Self::Periodical(q) => format!(
                "Workspace {} {} {} tasks",
                q.workspace_id,
                q.granularity.as_str(),
                q.project_type
            ),
            Self::Organization(q) => format!("Organization {} analytics", q.organization_id),
            Self::UserProjects(q) => format!("User {} project summary", q.user_id),
        }
    }
}

/// Computes a report from one snapshot. No side effects.
pub fn compute_report(dataset: &Dataset, request: &ReportRequest) -> Result<ComposedReport, CoreError> {
    let report = match request {
        ReportRequest::Participant(q) => {
            ComposedReport::Rows(vec![participant::participant_row(dataset, q)?])
        }
        ReportRequest::WorkspaceUsers(q) => {
            ComposedReport::Rows(workspace::workspace_user_analytics(dataset, q)?)
        }
        ReportRequest::WorkspaceProjects(q) => {
            ComposedReport::Rows(workspace::workspace_project_analytics(dataset, q)?)
        }
        ReportRequest::CumulativeByLanguage(q) => {
            ComposedReport::Rows(language::cumulative_by_language(dataset, q)?)
        }
        ReportRequest::CumulativeAllTypes(q) => {
            ComposedReport::ByProjectType(language::cumulative_all_types(dataset, q)?)
        }
        ReportRequest::Periodical(q) => {
            ComposedReport::Periodic(language::periodical_by_language(dataset, q)?)
        }
        ReportRequest::Organization(q) => {
            ComposedReport::Rows(organization::organization_user_analytics(dataset, q)?)
        }
        ReportRequest::UserProjects(q) => {
            ComposedReport::Summary(user_projects::user_project_summary(dataset, q)?)
        }
    };
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{DatasetBuilder, WORKSPACE};
    use crate::records::{ProjectStage, TaskStatus};
    use crate::stage::Stage;
    use assert_matches::assert_matches;

    fn dataset() -> Dataset {
        let mut b = DatasetBuilder::new();
        let p = b.project(ProjectStage::Review, "ContextualTranslationEditing", Some("Hindi"));
        b.task(p, TaskStatus::Reviewed);
        b.task(p, TaskStatus::Annotated);
        b.build()
    }

    #[test]
    fn compute_report_dispatches_and_is_idempotent() {
        let ds = dataset();
        let request = ReportRequest::CumulativeByLanguage(LanguageQuery {
            workspace_id: WORKSPACE,
            project_type: "ContextualTranslationEditing".into(),
            stage: Stage::Annotation,
            metainfo: false,
        });
        let first = compute_report(&ds, &request).unwrap();
        let second = compute_report(&ds, &request).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.row_count(), 1);
        assert_eq!(request.scope(), ReportScope::Workspace(WORKSPACE));
        assert_eq!(request.kind(), "cumulative_by_language");
    }

    #[test]
    fn compute_report_propagates_not_found() {
        let request = ReportRequest::WorkspaceProjects(ProjectAnalyticsQuery {
            workspace_id: 999,
            project_type: None,
            tgt_language: None,
        });
        assert_matches!(
            compute_report(&dataset(), &request),
            Err(CoreError::NotFound { entity: "Workspace", id: 999 })
        );
    }

    #[test]
    fn scope_serializes_tagged() {
        let v = serde_json::to_value(ReportScope::Organization(4)).unwrap();
        assert_eq!(v, serde_json::json!({"kind": "organization", "id": 4}));
    }
}
