//! Organization-wide annotator analytics.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::aggregate::{sort_rows, Tally};
use crate::capability::ProjectFamily;
use crate::compose::{ReportRow, RowBuilder};
use crate::error::CoreError;
use crate::metrics::{lead_time, word_count, MetricKind};
use crate::records::{
    role_name, AnnotationRecord, Dataset, ProjectRecord, TaskRecord, TaskStatus, UserRecord,
};
use crate::stage::{latest, Stage};
use crate::types::DbId;

use super::params::{DateRange, SortSpec};

pub const ANNOTATED_COLUMN: &str = "No. of Annotated Tasks in Given Date Range";
pub const WORD_COUNT_COLUMN: &str = "Word Count Of Annotated Tasks";

/// Columns every organization row carries, in output order.
const COLUMNS: &[&str] = &[
    "Annotator",
    "Email",
    "Language",
    "No. of Workspaces",
    "No. of Projects",
    "Assigned Tasks",
    ANNOTATED_COLUMN,
    "Unlabeled Tasks",
    "Skipped Tasks",
    "Draft Tasks",
    "Average Annotation Time (In Seconds)",
    "Participation Type",
    "User Role",
];

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationQuery {
    pub organization_id: DbId,
    pub range: DateRange,
    pub project_type: String,
    pub tgt_language: Option<String>,
    pub sort_by: Option<String>,
    pub descending: bool,
}

/// Validates the sort column against the family's columns.
fn resolve_sort(q: &OrganizationQuery, family: ProjectFamily) -> Result<SortSpec, CoreError> {
    let supports_words = family.capabilities().supports(MetricKind::WordCount);
    if q.sort_by.as_deref().map(str::trim) == Some(WORD_COUNT_COLUMN) && !supports_words {
        return Err(CoreError::Unsupported(format!(
            "Sorting by '{WORD_COUNT_COLUMN}' is only available for translation projects"
        )));
    }
    let mut allowed = COLUMNS.to_vec();
    if supports_words {
        allowed.push(WORD_COUNT_COLUMN);
    }
    SortSpec::resolve(q.sort_by.as_deref(), q.descending, ANNOTATED_COLUMN, &allowed)
}

/// The user's latest annotator annotation on a task.
fn own_annotation<'a>(dataset: &'a Dataset, task: &TaskRecord, user: DbId) -> Option<&'a AnnotationRecord> {
    latest(
        Stage::Annotation
            .annotations(dataset, task)
            .filter(|a| a.completed_by == Some(user)),
    )
}

fn user_row(
    dataset: &Dataset,
    user: &UserRecord,
    projects: &[&ProjectRecord],
    q: &OrganizationQuery,
    supports_words: bool,
) -> ReportRow {
    let mine: Vec<&ProjectRecord> = projects
        .iter()
        .copied()
        .filter(|p| p.annotators.contains(&user.id))
        .collect();
    let project_ids: BTreeSet<DbId> = mine.iter().map(|p| p.id).collect();
    let workspaces: BTreeSet<DbId> = mine.iter().map(|p| p.workspace_id).collect();

    let assigned: Vec<&TaskRecord> = dataset
        .tasks_in(&project_ids)
        .filter(|t| t.annotation_users.contains(&user.id))
        .collect();

    let mut annotated = 0u64;
    let mut lead = Tally::new();
    let mut words = Tally::new();
    for task in assigned.iter().copied().filter(|t| Stage::Annotation.is_completed(t)) {
        let Some(annotation) = own_annotation(dataset, task, user.id) else {
            continue;
        };
        if !q.range.contains(annotation.created_at) {
            continue;
        }
        annotated += 1;
        lead.record(lead_time(annotation));
        words.record(word_count(task));
    }
    let status_count =
        |status: TaskStatus| assigned.iter().filter(|t| t.status == status).count() as u64;

    RowBuilder::new()
        .text("Annotator", user.username.as_str())
        .text("Email", user.email.as_str())
        .text(
            "Language",
            q.tgt_language.as_deref().unwrap_or("No Language Selected"),
        )
        .count("No. of Workspaces", workspaces.len() as u64)
        .count("No. of Projects", mine.len() as u64)
        .count("Assigned Tasks", assigned.len() as u64)
        .count(ANNOTATED_COLUMN, annotated)
        .count("Unlabeled Tasks", status_count(TaskStatus::Unlabeled))
        .count("Skipped Tasks", status_count(TaskStatus::Skipped))
        .count("Draft Tasks", status_count(TaskStatus::Draft))
        .number("Average Annotation Time (In Seconds)", lead.average())
        .text("Participation Type", user.participation_type.label())
        .text("User Role", role_name(user.role))
        .when(supports_words, |r| r.number(WORD_COUNT_COLUMN, words.sum()))
        .build()
}

/// One row per organization user, sorted by the requested column.
pub fn organization_user_analytics(
    dataset: &Dataset,
    q: &OrganizationQuery,
) -> Result<Vec<ReportRow>, CoreError> {
    dataset.organization(q.organization_id)?;
    let family = ProjectFamily::of(&q.project_type);
    let sort = resolve_sort(q, family)?;
    let supports_words = family.capabilities().supports(MetricKind::WordCount);

    let projects: Vec<&ProjectRecord> = dataset
        .projects()
        .filter(|p| {
            p.organization_id == q.organization_id
                && p.project_type == q.project_type
                && q
                    .tgt_language
                    .as_deref()
                    .map_or(true, |l| p.tgt_language.as_deref() == Some(l))
        })
        .collect();

    let mut rows: Vec<ReportRow> = dataset
        .users()
        .filter(|u| u.organization_id == Some(q.organization_id))
        .filter(|u| q.tgt_language.as_deref().map_or(true, |l| u.speaks(l)))
        .map(|u| user_row(dataset, u, &projects, q, supports_words))
        .collect();

    sort_rows(&mut rows, &sort.column, sort.descending);
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
