//! Workspace-level user and project analytics.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::aggregate::{sort_rows, LanguageKey, Tally};
use crate::capability::ProjectFamily;
use crate::compose::{ReportRow, RowBuilder};
use crate::error::CoreError;
use crate::metrics::{
    annotation_word_error_rate, lead_time, raw_audio_duration, transcription_duration, word_count,
    MetricKind,
};
use crate::records::{
    Dataset, ParticipationType, ProjectRecord, ProjectStage, TaskRecord, TaskStatus,
};
use crate::stage::{final_annotation, latest, Stage, StageScope};
use crate::types::DbId;

use super::params::DateRange;
use super::participant::{participant_row, ParticipantQuery};

fn matches_filter(value: Option<&str>, filter: Option<&str>) -> bool {
    filter.map_or(true, |f| value == Some(f))
}

// ---------------------------------------------------------------------------
// User analytics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceUserQuery {
    pub workspace_id: DbId,
    pub stage: Stage,
    pub project_type: Option<String>,
    pub progress_stage: Option<ProjectStage>,
    pub tgt_language: Option<String>,
    /// `None` keeps every participant.
    pub participation_types: Option<Vec<ParticipationType>>,
    pub range: Option<DateRange>,
}

/// One participant row per member of the requested stage, in user id order.
pub fn workspace_user_analytics(
    dataset: &Dataset,
    q: &WorkspaceUserQuery,
) -> Result<Vec<ReportRow>, CoreError> {
    dataset.workspace(q.workspace_id)?;
    let scope = StageScope::with_override(q.stage, q.progress_stage)?;
    let family = q.project_type.as_deref().map(ProjectFamily::of);

    let mut participants: BTreeMap<DbId, BTreeSet<DbId>> = BTreeMap::new();
    for project in dataset.projects().filter(|p| {
        p.workspace_id == q.workspace_id
            && scope.admits(p.project_stage)
            && matches_filter(Some(p.project_type.as_str()), q.project_type.as_deref())
            && matches_filter(p.tgt_language.as_deref(), q.tgt_language.as_deref())
    }) {
        for user in q.stage.members(project) {
            participants.entry(*user).or_default().insert(project.id);
        }
    }

    let mut rows = Vec::with_capacity(participants.len());
    for (user_id, project_ids) in participants {
        let Ok(user) = dataset.user(user_id) else {
            continue;
        };
        if let Some(types) = &q.participation_types {
            if !types.contains(&user.participation_type) {
                continue;
            }
        }
        rows.push(participant_row(
            dataset,
            &ParticipantQuery {
                stage: q.stage,
                user_id,
                project_ids,
                range: q.range,
                progress_stage: q.progress_stage,
                family,
            },
        )?);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Project analytics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ProjectAnalyticsQuery {
    pub workspace_id: DbId,
    pub project_type: Option<String>,
    pub tgt_language: Option<String>,
}

fn project_row(dataset: &Dataset, project: &ProjectRecord, tasks: &[&TaskRecord]) -> ReportRow {
    let caps = ProjectFamily::of(&project.project_type).capabilities();
    let reviewed_stage = project.project_stage >= ProjectStage::Review;
    let super_check_stage = project.project_stage >= ProjectStage::SuperCheck;

    let annotated = Stage::Annotation.classify(tasks.iter().copied());
    let reviewed = Stage::Review.classify(tasks.iter().copied());
    let status_count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count() as u64;

    let lead: Tally = annotated
        .iter()
        .map(|t| latest(Stage::Annotation.annotations(dataset, t)).and_then(lead_time))
        .collect();

    let mut row = RowBuilder::new()
        .count("Project Id", project.id as u64)
        .text("Project Name", project.title.as_str())
        .text("Language", LanguageKey::of(project.tgt_language.as_deref()).label())
        .text("Project Type", project.project_type.as_str())
        .text("Stage", project.project_stage.label())
        .count("Total Tasks", tasks.len() as u64)
        .count("Annotated Tasks", annotated.len() as u64)
        .when(reviewed_stage, |r| r.count("Reviewed Tasks", reviewed.len() as u64))
        .when(super_check_stage, |r| {
            r.count(
                "Super Checked Tasks",
                Stage::SuperCheck.classify(tasks.iter().copied()).len() as u64,
            )
        })
        .count("Unlabeled Tasks", status_count(TaskStatus::Unlabeled))
        .count("Skipped Tasks", status_count(TaskStatus::Skipped))
        .number("Average Annotation Time (In Seconds)", lead.average());

    if caps.supports(MetricKind::WordCount) {
        let annotated_words: Tally = annotated.iter().map(|t| word_count(t)).collect();
        row = row.number("Annotated Word Count", annotated_words.sum());
        if reviewed_stage {
            let reviewed_words: Tally = reviewed.iter().map(|t| word_count(t)).collect();
            row = row.number("Reviewed Word Count", reviewed_words.sum());
        }
    }

    if caps.supports(MetricKind::AudioDuration) {
        let segments: Tally = annotated
            .iter()
            .map(|t| final_annotation(dataset, t).and_then(|a| transcription_duration(&a.result)))
            .collect();
        row = row.duration("Annotated Audio Duration", segments.sum());
    }

    if caps.supports(MetricKind::RawAudioDuration) {
        let raw: Tally = annotated.iter().map(|t| raw_audio_duration(t)).collect();
        row = row.duration("Total Raw Audio Duration", raw.sum());
    }

    if caps.supports(MetricKind::WordErrorRate) && reviewed_stage {
        let wer: Tally = tasks
            .iter()
            .flat_map(|t| Stage::Review.annotations(dataset, t))
            .filter(|a| a.status.is_accepted())
            .map(|a| annotation_word_error_rate(dataset, a))
            .collect();
        row = row.number("Average Word Error Rate A/R", wer.average());
    }

    row.build()
}

/// One row per project in the workspace, sorted by project name.
pub fn workspace_project_analytics(
    dataset: &Dataset,
    q: &ProjectAnalyticsQuery,
) -> Result<Vec<ReportRow>, CoreError> {
    dataset.workspace(q.workspace_id)?;

    let projects: Vec<&ProjectRecord> = dataset
        .projects()
        .filter(|p| {
            p.workspace_id == q.workspace_id
                && matches_filter(Some(p.project_type.as_str()), q.project_type.as_deref())
                && matches_filter(p.tgt_language.as_deref(), q.tgt_language.as_deref())
        })
        .collect();

    let mut tasks_by_project: BTreeMap<DbId, Vec<&TaskRecord>> = BTreeMap::new();
    for task in dataset.tasks() {
        tasks_by_project.entry(task.project_id).or_default().push(task);
    }

    let mut rows: Vec<ReportRow> = projects
        .iter()
        .map(|p| {
            let tasks = tasks_by_project.get(&p.id).map_or(&[][..], Vec::as_slice);
            project_row(dataset, p, tasks)
        })
        .collect();
    sort_rows(&mut rows, "Project Name", false);
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
