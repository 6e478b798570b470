//! Per-project summary of one annotator's work.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::aggregate::{sort_rows, Tally};
use crate::capability::ProjectFamily;
use crate::compose::{RowBuilder, UserSummary};
use crate::error::CoreError;
use crate::metrics::{lead_time, word_count, MetricKind};
use crate::records::{AnnotationRecord, Dataset};
use crate::stage::Stage;
use crate::types::DbId;

use super::params::DateRange;

const ANNOTATED: &str = "Annotated Tasks";
const WORD_COUNT: &str = "Word Count";
const LEAD_TIME: &str = "Average Annotation Time (In Seconds)";

#[derive(Debug, Clone, Serialize)]
pub struct UserProjectsQuery {
    pub user_id: DbId,
    pub project_type: String,
    pub range: DateRange,
}

#[derive(Default)]
struct ProjectTotals {
    annotated: u64,
    words: Tally,
    lead: Tally,
}

impl ProjectTotals {
    fn merge(&mut self, other: &ProjectTotals) {
        self.annotated += other.annotated;
        self.words.merge(&other.words);
        self.lead.merge(&other.lead);
    }
}

/// Rows per project the user annotates, most annotated first, plus a
/// one-row total.
pub fn user_project_summary(dataset: &Dataset, q: &UserProjectsQuery) -> Result<UserSummary, CoreError> {
    let user = dataset.user(q.user_id)?;
    let supports_words = ProjectFamily::of(&q.project_type)
        .capabilities()
        .supports(MetricKind::WordCount);

    let render = |title: Option<&str>, totals: &ProjectTotals| {
        let mut row = RowBuilder::new();
        if let Some(title) = title {
            row = row.text("Project Name", title);
        }
        row.count(ANNOTATED, totals.annotated)
            .when(supports_words, |r| r.number(WORD_COUNT, totals.words.sum()))
            .number(LEAD_TIME, totals.lead.average())
            .build()
    };

    let mut overall = ProjectTotals::default();
    let mut project_summary = Vec::new();
    for project in dataset
        .projects()
        .filter(|p| p.project_type == q.project_type && p.annotators.contains(&user.id))
    {
        let ids = BTreeSet::from([project.id]);
        let mut totals = ProjectTotals::default();
        for task in dataset
            .tasks_in(&ids)
            .filter(|t| t.annotation_users.contains(&user.id) && Stage::Annotation.is_completed(t))
        {
            let own: Vec<&AnnotationRecord> = Stage::Annotation
                .annotations(dataset, task)
                .filter(|a| {
                    a.completed_by == Some(user.id)
                        && a.parent_annotation_id.is_none()
                        && q.range.contains(a.created_at)
                })
                .collect();
            if own.is_empty() {
                continue;
            }
            totals.annotated += 1;
            totals.words.record(word_count(task));
            for annotation in own {
                totals.lead.record(lead_time(annotation));
            }
        }
        overall.merge(&totals);
        project_summary.push(render(Some(project.title.as_str()), &totals));
    }

    sort_rows(&mut project_summary, ANNOTATED, true);
    Ok(UserSummary {
        total_summary: vec![render(None, &overall)],
        project_summary,
    })
}
