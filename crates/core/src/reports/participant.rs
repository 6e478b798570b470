//! Per-participant rows for annotators, reviewers and super-checkers.
//!
//! One code path serves all three stages. What differs between them (status
//! columns, metric buckets, where rejection loops are read from) lives in a
//! static [`StageProfile`] table.

use std::collections::BTreeSet;

use serde_json::json;

use crate::aggregate::Tally;
use crate::capability::ProjectFamily;
use crate::compose::{ReportRow, RowBuilder};
use crate::error::CoreError;
use crate::metrics::{
    annotation_word_error_rate, lead_time, raw_audio_duration, transcription_duration, word_count,
    MetricKind,
};
use crate::records::{
    role_name, AnnotationRecord, AnnotationStatus, AnnotationType, Dataset, ProjectStage,
    RevisionLoops, TaskRecord, TaskStatus, ACCEPTED_STATUSES,
};
use crate::stage::{latest_per_task, Stage};
use crate::types::DbId;

use super::params::{within, DateRange};

// ---------------------------------------------------------------------------
// Stage profiles
// ---------------------------------------------------------------------------

enum StatusColumn {
    /// The participant's own annotations in the window with this status.
    Annotations(&'static str, AnnotationStatus),
    /// Assigned tasks currently in this status, regardless of the window.
    PendingTasks(&'static str, TaskStatus),
}

/// A metric column computed over annotations with the given statuses.
/// `None` means every status.
struct Bucket {
    column: &'static str,
    statuses: Option<&'static [AnnotationStatus]>,
}

enum ErrorRateSource {
    /// The participant's own annotations, compared with their parents.
    Own(Option<&'static [AnnotationStatus]>),
    /// Super-check annotations made on top of the participant's work, on
    /// tasks that finished super-check.
    SuperCheckedChildren,
}

struct ErrorRateColumn {
    column: &'static str,
    source: ErrorRateSource,
}

#[derive(Clone, Copy)]
enum LoopCounter {
    Review,
    SuperCheck,
}

impl LoopCounter {
    fn read(self, loops: &RevisionLoops) -> i32 {
        match self {
            Self::Review => loops.review_count,
            Self::SuperCheck => loops.super_check_count,
        }
    }
}

enum LoopSource {
    /// Downstream annotations of this type chained to the participant's.
    Children(AnnotationType),
    /// The participant's own annotations.
    Own,
}

struct StageProfile {
    status_columns: &'static [StatusColumn],
    lead_time: Option<Bucket>,
    word_count: &'static [Bucket],
    duration: &'static [Bucket],
    raw_audio: Option<&'static [AnnotationStatus]>,
    error_rate: &'static [ErrorRateColumn],
    loop_source: LoopSource,
    loop_counter: LoopCounter,
}

const LABELED: &[AnnotationStatus] = &[AnnotationStatus::Labeled];

const ANNOTATOR: StageProfile = StageProfile {
    status_columns: &[
        StatusColumn::Annotations("Annotated", AnnotationStatus::Labeled),
        StatusColumn::PendingTasks("Unlabeled", TaskStatus::Unlabeled),
        StatusColumn::Annotations("Skipped", AnnotationStatus::Skipped),
        StatusColumn::Annotations("Draft", AnnotationStatus::Draft),
        StatusColumn::Annotations("To Be Revised", AnnotationStatus::ToBeRevised),
    ],
    lead_time: Some(Bucket {
        column: "Average Annotation Time (In Seconds)",
        statuses: Some(LABELED),
    }),
    word_count: &[Bucket {
        column: "Total Word Count",
        statuses: Some(LABELED),
    }],
    duration: &[Bucket {
        column: "Total Segments Duration",
        statuses: Some(LABELED),
    }],
    raw_audio: Some(LABELED),
    error_rate: &[],
    loop_source: LoopSource::Children(AnnotationType::Reviewer),
    loop_counter: LoopCounter::Review,
};

const REVIEWER: StageProfile = StageProfile {
    status_columns: &[
        StatusColumn::Annotations("Accepted", AnnotationStatus::Accepted),
        StatusColumn::Annotations(
            "Accepted With Minor Changes",
            AnnotationStatus::AcceptedWithMinorChanges,
        ),
        StatusColumn::Annotations(
            "Accepted With Major Changes",
            AnnotationStatus::AcceptedWithMajorChanges,
        ),
        StatusColumn::PendingTasks("Unreviewed", TaskStatus::Annotated),
        StatusColumn::Annotations("To Be Revised", AnnotationStatus::ToBeRevised),
        StatusColumn::Annotations("Skipped", AnnotationStatus::Skipped),
        StatusColumn::Annotations("Draft", AnnotationStatus::Draft),
    ],
    lead_time: None,
    word_count: &[Bucket {
        column: "Total Word Count",
        statuses: Some(ACCEPTED_STATUSES),
    }],
    duration: &[Bucket {
        column: "Total Segments Duration",
        statuses: Some(ACCEPTED_STATUSES),
    }],
    raw_audio: Some(ACCEPTED_STATUSES),
    error_rate: &[
        ErrorRateColumn {
            column: "Average Word Error Rate A/R",
            source: ErrorRateSource::Own(Some(ACCEPTED_STATUSES)),
        },
        ErrorRateColumn {
            column: "Average Word Error Rate R/S",
            source: ErrorRateSource::SuperCheckedChildren,
        },
    ],
    loop_source: LoopSource::Children(AnnotationType::SuperChecker),
    loop_counter: LoopCounter::SuperCheck,
};

const SUPER_CHECKER: StageProfile = StageProfile {
    status_columns: &[
        StatusColumn::Annotations("Validated", AnnotationStatus::Validated),
        StatusColumn::Annotations(
            "Validated With Changes",
            AnnotationStatus::ValidatedWithChanges,
        ),
        StatusColumn::Annotations("Rejected", AnnotationStatus::Rejected),
        StatusColumn::Annotations("Unvalidated", AnnotationStatus::Unvalidated),
        StatusColumn::Annotations("Skipped", AnnotationStatus::Skipped),
        StatusColumn::Annotations("Draft", AnnotationStatus::Draft),
    ],
    lead_time: None,
    word_count: &[
        Bucket {
            column: "Validated Word Count",
            statuses: Some(&[AnnotationStatus::Validated]),
        },
        Bucket {
            column: "Validated With Changes Word Count",
            statuses: Some(&[AnnotationStatus::ValidatedWithChanges]),
        },
        Bucket {
            column: "Rejected Word Count",
            statuses: Some(&[AnnotationStatus::Rejected]),
        },
    ],
    duration: &[
        Bucket {
            column: "Validated Audio Duration",
            statuses: Some(&[AnnotationStatus::Validated]),
        },
        Bucket {
            column: "Validated With Changes Audio Duration",
            statuses: Some(&[AnnotationStatus::ValidatedWithChanges]),
        },
        Bucket {
            column: "Rejected Audio Duration",
            statuses: Some(&[AnnotationStatus::Rejected]),
        },
    ],
    raw_audio: None,
    error_rate: &[ErrorRateColumn {
        column: "Average Word Error Rate R/S",
        source: ErrorRateSource::Own(None),
    }],
    loop_source: LoopSource::Own,
    loop_counter: LoopCounter::SuperCheck,
};

/// Downstream outcome columns added to reviewer rows on super-check projects.
const DOWNSTREAM_COLUMNS: &[(&str, AnnotationStatus)] = &[
    ("Validated", AnnotationStatus::Validated),
    ("Validated With Changes", AnnotationStatus::ValidatedWithChanges),
    ("Rejected", AnnotationStatus::Rejected),
];

fn profile(stage: Stage) -> &'static StageProfile {
    match stage {
        Stage::Annotation => &ANNOTATOR,
        Stage::Review => &REVIEWER,
        Stage::SuperCheck => &SUPER_CHECKER,
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// One participant's work in one stage over a set of projects.
#[derive(Debug, Clone)]
pub struct ParticipantQuery {
    pub stage: Stage,
    pub user_id: DbId,
    pub project_ids: BTreeSet<DbId>,
    /// `None` covers all time.
    pub range: Option<DateRange>,
    pub progress_stage: Option<ProjectStage>,
    /// Family of the requested project type; `None` omits family metrics.
    pub family: Option<ProjectFamily>,
}

fn having<'a>(
    annotations: &[&'a AnnotationRecord],
    statuses: Option<&[AnnotationStatus]>,
) -> Vec<&'a AnnotationRecord> {
    annotations
        .iter()
        .copied()
        .filter(|a| statuses.map_or(true, |s| s.contains(&a.status)))
        .collect()
}

fn validated_downstream(dataset: &Dataset, annotation: &AnnotationRecord) -> bool {
    dataset
        .children_of(annotation.id)
        .any(|c| c.annotation_type == AnnotationType::SuperChecker && c.status.is_validated())
}

fn children_of_type<'a>(
    dataset: &'a Dataset,
    annotations: &[&'a AnnotationRecord],
    kind: AnnotationType,
) -> Vec<&'a AnnotationRecord> {
    annotations
        .iter()
        .flat_map(|a| dataset.children_of(a.id))
        .filter(|c| c.annotation_type == kind)
        .collect()
}

/// Builds the report row for one participant.
pub fn participant_row(dataset: &Dataset, q: &ParticipantQuery) -> Result<ReportRow, CoreError> {
    let user = dataset.user(q.user_id)?;
    if let Some(&id) = q.project_ids.iter().find(|id| dataset.project(**id).is_none()) {
        return Err(CoreError::NotFound { entity: "Project", id });
    }
    let stage = q.stage;
    let profile = profile(stage);

    let assigned: Vec<&TaskRecord> = dataset
        .tasks_in(&q.project_ids)
        .filter(|t| stage.is_assigned(t, user.id))
        .collect();

    let own: Vec<&AnnotationRecord> = assigned
        .iter()
        .copied()
        .flat_map(|t| stage.annotations(dataset, t))
        .filter(|a| stage != Stage::Annotation || a.completed_by == Some(user.id))
        .filter(|a| within(q.range.as_ref(), a.updated_at))
        .collect();

    let mut row = RowBuilder::new()
        .text(&format!("{} Name", stage.participant_label()), user.username.as_str())
        .text("Email", user.email.as_str())
        .text("Participation Type", user.participation_type.label())
        .text("User Role", role_name(user.role))
        .value("Language", json!(user.languages))
        .count("Assigned", assigned.len() as u64);

    // -- status columns -----------------------------------------------------

    let downstream = stage == Stage::Review && q.progress_stage == Some(ProjectStage::SuperCheck);
    for column in profile.status_columns {
        row = match column {
            StatusColumn::Annotations(name, status) => {
                let matching = own.iter().filter(|a| a.status == *status);
                let n = if downstream && status.is_accepted() {
                    matching.filter(|a| !validated_downstream(dataset, a)).count()
                } else {
                    matching.count()
                };
                row.count(name, n as u64)
            }
            StatusColumn::PendingTasks(name, status) => {
                let n = assigned.iter().filter(|t| t.status == *status).count();
                row.count(name, n as u64)
            }
        };
    }

    if downstream {
        let checks = children_of_type(dataset, &own, AnnotationType::SuperChecker);
        for (name, status) in DOWNSTREAM_COLUMNS {
            let n = checks.iter().filter(|c| c.status == *status).count();
            row = row.count(name, n as u64);
        }
    }

    if let Some(bucket) = &profile.lead_time {
        let tally: Tally = having(&own, bucket.statuses)
            .into_iter()
            .map(lead_time)
            .collect();
        row = row.number(bucket.column, tally.average());
    }

    // -- rejection loops ----------------------------------------------------

    let loop_sample = match profile.loop_source {
        LoopSource::Children(kind) => children_of_type(dataset, &own, kind),
        LoopSource::Own => own.clone(),
    };
    let mut loops = Tally::new();
    let mut maxed_out = 0u64;
    for annotation in &loop_sample {
        let Some(task) = dataset.task_of(annotation) else {
            continue;
        };
        let count = profile.loop_counter.read(&task.revision_loops);
        loops.record(Some(f64::from(count)));
        if dataset
            .project_of(task)
            .is_some_and(|p| count >= p.revision_loop_limit)
        {
            maxed_out += 1;
        }
    }
    row = row
        .number("Average Rejection Loop Value", loops.average())
        .count("Tasks Rejected Maximum Time", maxed_out);

    // -- family metrics -----------------------------------------------------

    let Some(family) = q.family else {
        return Ok(row.build());
    };
    let caps = family.capabilities();

    if caps.supports(MetricKind::WordCount) {
        for bucket in profile.word_count {
            let tally: Tally = latest_per_task(having(&own, bucket.statuses))
                .into_iter()
                .map(|a| dataset.task_of(a).and_then(word_count))
                .collect();
            row = row.number(bucket.column, tally.sum());
        }
    }

    if caps.supports(MetricKind::AudioDuration) {
        for bucket in profile.duration {
            let tally: Tally = latest_per_task(having(&own, bucket.statuses))
                .into_iter()
                .map(|a| transcription_duration(&a.result))
                .collect();
            row = row.duration(bucket.column, tally.sum());
        }
    }

    if caps.supports(MetricKind::RawAudioDuration) {
        let tally: Tally = latest_per_task(having(&own, profile.raw_audio))
            .into_iter()
            .map(|a| dataset.task_of(a).and_then(raw_audio_duration))
            .collect();
        row = row.duration("Total Raw Audio Duration", tally.sum());
    }

    if caps.supports(MetricKind::WordErrorRate) {
        for column in profile.error_rate {
            let sample = match column.source {
                ErrorRateSource::Own(statuses) => having(&own, statuses),
                ErrorRateSource::SuperCheckedChildren => {
                    children_of_type(dataset, &own, AnnotationType::SuperChecker)
                        .into_iter()
                        .filter(|c| {
                            dataset
                                .task_of(c)
                                .is_some_and(|t| t.status == TaskStatus::SuperChecked)
                        })
                        .collect()
                }
            };
            let tally: Tally = sample
                .into_iter()
                .map(|a| annotation_word_error_rate(dataset, a))
                .collect();
            row = row.number(column.column, tally.average());
        }
    }

    Ok(row.build())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, transcription, DatasetBuilder};
    use assert_matches::assert_matches;
    use serde_json::{json, Value};

    struct Setup {
        ds: Dataset,
        reviewer: DbId,
        annotator: DbId,
        project: DbId,
    }

    /// Review project with three tasks: one accepted, one accepted with minor
    /// changes then validated downstream, one sent back.
    fn review_setup(project_type: &str, stage: ProjectStage) -> Setup {
        let mut b = DatasetBuilder::new();
        let annotator = b.user("ann", 1);
        let reviewer = b.user("rev", 2);
        let project = b.project(stage, project_type, Some("Hindi"));
        b.member(project, Stage::Annotation, annotator);
        b.member(project, Stage::Review, reviewer);

        let specs = [
            (TaskStatus::Reviewed, AnnotationStatus::Accepted, None),
            (
                TaskStatus::SuperChecked,
                AnnotationStatus::AcceptedWithMinorChanges,
                Some(AnnotationStatus::Validated),
            ),
            (TaskStatus::Annotated, AnnotationStatus::ToBeRevised, None),
        ];
        for (i, (task_status, review_status, check)) in specs.into_iter().enumerate() {
            let t = b.task(project, task_status);
            b.task_mut(t).annotation_users = vec![annotator];
            b.task_mut(t).review_user = Some(reviewer);
            b.task_mut(t).data = json!({"word_count": 10 * (i + 1), "audio_duration": 60.0});
            b.task_mut(t).revision_loops.super_check_count = i as i32;
            let a = b.annotation(t, AnnotationType::Annotator, AnnotationStatus::Labeled, 2);
            b.annotation_mut(a).completed_by = Some(annotator);
            b.annotation_mut(a).lead_time = Some(30.0);
            b.annotation_mut(a).result = transcription(&[(0.0, 4.0, "one two three four")]);
            let r = b.child(a, AnnotationType::Reviewer, review_status, 3);
            b.annotation_mut(r).completed_by = Some(reviewer);
            b.annotation_mut(r).result = transcription(&[(0.0, 5.0, "one two three five")]);
            if let Some(status) = check {
                let s = b.child(r, AnnotationType::SuperChecker, status, 4);
                b.annotation_mut(s).result = transcription(&[(0.0, 5.0, "one two three five")]);
            }
        }
        Setup {
            ds: b.build(),
            reviewer,
            annotator,
            project,
        }
    }

    fn query(s: &Setup, stage: Stage, user: DbId, family: Option<ProjectFamily>) -> ParticipantQuery {
        ParticipantQuery {
            stage,
            user_id: user,
            project_ids: BTreeSet::from([s.project]),
            range: None,
            progress_stage: None,
            family,
        }
    }

    #[test]
    fn reviewer_status_columns() {
        let s = review_setup("ContextualTranslationEditing", ProjectStage::Review);
        let row = participant_row(&s.ds, &query(&s, Stage::Review, s.reviewer, None)).unwrap();
        assert_eq!(row["Reviewer Name"], json!("rev"));
        assert_eq!(row["Participation Type"], json!("Part Time"));
        assert_eq!(row["Assigned"], json!(3));
        assert_eq!(row["Accepted"], json!(1));
        assert_eq!(row["Accepted With Minor Changes"], json!(1));
        assert_eq!(row["To Be Revised"], json!(1));
        assert_eq!(row["Unreviewed"], json!(1));
        assert!(!row.contains_key("Validated"));
        assert!(!row.contains_key("Total Word Count"));
    }

    #[test]
    fn reviewer_on_super_check_projects_excludes_validated_acceptances() {
        let s = review_setup("ContextualTranslationEditing", ProjectStage::SuperCheck);
        let mut q = query(&s, Stage::Review, s.reviewer, None);
        q.progress_stage = Some(ProjectStage::SuperCheck);
        let row = participant_row(&s.ds, &q).unwrap();
        assert_eq!(row["Accepted"], json!(1));
        assert_eq!(row["Accepted With Minor Changes"], json!(0));
        assert_eq!(row["Validated"], json!(1));
        assert_eq!(row["Rejected"], json!(0));
    }

    #[test]
    fn translation_word_count_uses_accepted_reviews() {
        let s = review_setup("ContextualTranslationEditing", ProjectStage::Review);
        let row = participant_row(
            &s.ds,
            &query(&s, Stage::Review, s.reviewer, Some(ProjectFamily::Translation)),
        )
        .unwrap();
        // tasks 1 and 2 accepted: 10 + 20
        assert_eq!(row["Total Word Count"], json!(30));
        assert!(!row.contains_key("Total Segments Duration"));
    }

    #[test]
    fn audio_reviewer_metrics() {
        let s = review_setup("AudioTranscription", ProjectStage::SuperCheck);
        let row = participant_row(
            &s.ds,
            &query(&s, Stage::Review, s.reviewer, Some(ProjectFamily::Audio)),
        )
        .unwrap();
        assert_eq!(row["Total Segments Duration"], json!("0:00:10"));
        assert_eq!(row["Total Raw Audio Duration"], json!("0:02:00"));
        // one of four words changed against the annotator's transcript
        assert_eq!(row["Average Word Error Rate A/R"], json!(0.25));
        assert_eq!(row["Average Word Error Rate R/S"], json!(0));
        assert!(!row.contains_key("Total Word Count"));
    }

    #[test]
    fn rejection_loops_read_from_super_checks() {
        let s = review_setup("AudioTranscription", ProjectStage::SuperCheck);
        let row = participant_row(&s.ds, &query(&s, Stage::Review, s.reviewer, None)).unwrap();
        // only task 2 has a super-check child; its loop count is 1, limit 2
        assert_eq!(row["Average Rejection Loop Value"], json!(1));
        assert_eq!(row["Tasks Rejected Maximum Time"], json!(0));
    }

    #[test]
    fn annotator_row_has_lead_time() {
        let s = review_setup("OCRTranscription", ProjectStage::Review);
        let row = participant_row(
            &s.ds,
            &query(&s, Stage::Annotation, s.annotator, Some(ProjectFamily::Other)),
        )
        .unwrap();
        assert_eq!(row["Annotator Name"], json!("ann"));
        assert_eq!(row["Annotated"], json!(3));
        assert_eq!(row["Average Annotation Time (In Seconds)"], json!(30));
        assert!(!row.contains_key("Total Word Count"));
        assert!(!row.contains_key("Total Segments Duration"));
    }

    #[test]
    fn window_excludes_annotations_outside_range() {
        let s = review_setup("ContextualTranslationEditing", ProjectStage::Review);
        let mut q = query(&s, Stage::Review, s.reviewer, None);
        q.range = Some(DateRange::new(date("2024-02-01"), date("2024-02-28")).unwrap());
        let row = participant_row(&s.ds, &q).unwrap();
        assert_eq!(row["Assigned"], json!(3));
        assert_eq!(row["Accepted"], json!(0));
        assert_eq!(row["Average Rejection Loop Value"], json!(0));
    }

    #[test]
    fn unknown_user_is_not_found() {
        let s = review_setup("ContextualTranslationEditing", ProjectStage::Review);
        let err = participant_row(&s.ds, &query(&s, Stage::Review, 9999, None)).unwrap_err();
        assert_matches!(err, CoreError::NotFound { entity: "User", .. });
    }

    #[test]
    fn unknown_project_is_not_found() {
        let s = review_setup("ContextualTranslationEditing", ProjectStage::Review);
        let mut q = query(&s, Stage::Review, s.reviewer, None);
        q.project_ids.insert(424242);
        assert_matches!(
            participant_row(&s.ds, &q),
            Err(CoreError::NotFound { entity: "Project", id: 424242 })
        );
    }

    #[test]
    fn languages_emitted_as_list() {
        let s = review_setup("ContextualTranslationEditing", ProjectStage::Review);
        let row = participant_row(&s.ds, &query(&s, Stage::Review, s.reviewer, None)).unwrap();
        assert_eq!(row["Language"], Value::from(vec!["Hindi"]));
    }
}
