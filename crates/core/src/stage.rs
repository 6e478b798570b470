//! Stage classification: which tasks and annotations belong to a pipeline
//! stage, and which projects a stage-scoped report may look at.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::records::{
    AnnotationRecord, AnnotationStatus, AnnotationType, Dataset, ProjectRecord, ProjectStage,
    TaskRecord, TaskStatus,
};
use crate::types::DbId;

/// Pipeline stage a report is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Annotation,
    Review,
    SuperCheck,
}

/// Task statuses that mean "this stage is done with the task".
const ANNOTATION_COMPLETED: &[TaskStatus] = &[
    TaskStatus::Annotated,
    TaskStatus::Reviewed,
    TaskStatus::Exported,
    TaskStatus::SuperChecked,
];
const REVIEW_COMPLETED: &[TaskStatus] = &[
    TaskStatus::Reviewed,
    TaskStatus::Exported,
    TaskStatus::SuperChecked,
];
const SUPER_CHECK_COMPLETED: &[TaskStatus] = &[TaskStatus::SuperChecked];

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Annotation, Stage::Review, Stage::SuperCheck];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annotation => "annotation",
            Self::Review => "review",
            Self::SuperCheck => "super_check",
        }
    }

    /// Role label used in report headers ("Reviewer Name", ...).
    pub fn participant_label(&self) -> &'static str {
        match self {
            Self::Annotation => "Annotator",
            Self::Review => "Reviewer",
            Self::SuperCheck => "SuperChecker",
        }
    }

    pub fn annotation_type(&self) -> AnnotationType {
        match self {
            Self::Annotation => AnnotationType::Annotator,
            Self::Review => AnnotationType::Reviewer,
            Self::SuperCheck => AnnotationType::SuperChecker,
        }
    }

    /// The project stage a project must reach before this stage exists.
    pub fn project_stage(&self) -> ProjectStage {
        match self {
            Self::Annotation => ProjectStage::Annotation,
            Self::Review => ProjectStage::Review,
            Self::SuperCheck => ProjectStage::SuperCheck,
        }
    }

    pub fn completed_task_statuses(&self) -> &'static [TaskStatus] {
        match self {
            Self::Annotation => ANNOTATION_COMPLETED,
            Self::Review => REVIEW_COMPLETED,
            Self::SuperCheck => SUPER_CHECK_COMPLETED,
        }
    }

    /// Picks the stage from the two report flags callers send. Reviewer
    /// reports win when both are set.
    pub fn from_report_flags(reviewer_reports: bool, supercheck_reports: bool) -> Self {
        if reviewer_reports {
            Self::Review
        } else if supercheck_reports {
            Self::SuperCheck
        } else {
            Self::Annotation
        }
    }

    /// Members of `project` that work this stage.
    pub fn members<'a>(&self, project: &'a ProjectRecord) -> &'a [DbId] {
        match self {
            Self::Annotation => &project.annotators,
            Self::Review => &project.reviewers,
            Self::SuperCheck => &project.super_checkers,
        }
    }

    /// Whether `user` is the assignee of `task` for this stage.
    pub fn is_assigned(&self, task: &TaskRecord, user: DbId) -> bool {
        match self {
            Self::Annotation => task.annotation_users.contains(&user),
            Self::Review => task.review_user == Some(user),
            Self::SuperCheck => task.super_check_user == Some(user),
        }
    }

    pub fn is_completed(&self, task: &TaskRecord) -> bool {
        self.completed_task_statuses().contains(&task.status)
    }

    /// Whether an annotation counts as finished work for this stage.
    ///
    /// Review annotations sent back for revision are assigned work, not
    /// completed work.
    pub fn counts_as_completed(&self, annotation: &AnnotationRecord) -> bool {
        annotation.annotation_type == self.annotation_type()
            && !(*self == Self::Review && annotation.status == AnnotationStatus::ToBeRevised)
    }

    /// Tasks whose status marks them as completed for this stage.
    pub fn classify<'a, I>(&self, tasks: I) -> Vec<&'a TaskRecord>
    where
        I: IntoIterator<Item = &'a TaskRecord>,
    {
        tasks.into_iter().filter(|t| self.is_completed(t)).collect()
    }

    /// Annotations on `task` produced by this stage.
    pub fn annotations<'a>(
        &self,
        dataset: &'a Dataset,
        task: &TaskRecord,
    ) -> impl Iterator<Item = &'a AnnotationRecord> + 'a {
        let kind = self.annotation_type();
        dataset
            .annotations_of(task.id)
            .filter(move |a| a.annotation_type == kind)
    }
}

impl FromStr for Stage {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "annotation" => Ok(Self::Annotation),
            "review" => Ok(Self::Review),
            "super_check" | "supercheck" => Ok(Self::SuperCheck),
            _ => Err(CoreError::Validation(format!(
                "Invalid stage '{s}'. Must be one of: annotation, review, super_check"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Project scope
// ---------------------------------------------------------------------------

/// Which projects a stage report considers, by project stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageScope {
    /// The project stage is at least this one.
    AtLeast(ProjectStage),
    /// The project stage is exactly this one.
    Exactly(ProjectStage),
}

impl StageScope {
    pub fn for_stage(stage: Stage) -> Self {
        Self::AtLeast(stage.project_stage())
    }

    /// Applies an explicit `project_progress_stage` override.
    ///
    /// An override below the stage being reported on is rejected: those
    /// projects never produce annotations for that stage.
    pub fn with_override(stage: Stage, progress: Option<ProjectStage>) -> Result<Self, CoreError> {
        match progress {
            None => Ok(Self::for_stage(stage)),
            Some(p) if p >= stage.project_stage() => Ok(Self::Exactly(p)),
            Some(p) => Err(CoreError::Validation(format!(
                "{} stage projects don't have {} reports.",
                p.label(),
                stage.participant_label().to_lowercase()
            ))),
        }
    }

    pub fn admits(&self, project_stage: ProjectStage) -> bool {
        match self {
            Self::AtLeast(min) => project_stage >= *min,
            Self::Exactly(s) => project_stage == *s,
        }
    }
}

// ---------------------------------------------------------------------------
// Final annotation
// ---------------------------------------------------------------------------

/// Most recently updated annotation in `candidates` (ties go to the higher id).
pub fn latest<'a, I>(candidates: I) -> Option<&'a AnnotationRecord>
where
    I: IntoIterator<Item = &'a AnnotationRecord>,
{
    candidates
        .into_iter()
        .max_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)))
}

/// The one annotation that carries a task's content for metric extraction.
///
/// Follows the task status to the stage that last touched it: reviewed tasks
/// use the reviewer's annotation, super-checked tasks the super-checker's,
/// exported tasks the designated correct annotation. Anything else falls back
/// to the correct annotation, then to the latest annotator annotation.
pub fn final_annotation<'a>(dataset: &'a Dataset, task: &TaskRecord) -> Option<&'a AnnotationRecord> {
    let of_type = |stage: Stage| latest(stage.annotations(dataset, task));
    let correct = || task.correct_annotation_id.and_then(|id| dataset.annotation(id));

    match task.status {
        TaskStatus::Reviewed => of_type(Stage::Review).or_else(correct),
        TaskStatus::SuperChecked => of_type(Stage::SuperCheck).or_else(correct),
        TaskStatus::Annotated => of_type(Stage::Annotation).or_else(correct),
        _ => correct().or_else(|| of_type(Stage::Annotation)),
    }
}

/// Keeps only the latest annotation per task so a task never contributes
/// twice to a per-task metric. Output is ordered by task id.
pub fn latest_per_task<'a, I>(annotations: I) -> Vec<&'a AnnotationRecord>
where
    I: IntoIterator<Item = &'a AnnotationRecord>,
{
    let mut by_task: BTreeMap<DbId, &'a AnnotationRecord> = BTreeMap::new();
    for a in annotations {
        by_task
            .entry(a.task_id)
            .and_modify(|cur| {
                if (a.updated_at, a.id) > (cur.updated_at, cur.id) {
                    *cur = a;
                }
            })
            .or_insert(a);
    }
    by_task.into_values().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
