//! Read-only records the reporting core aggregates over.
//!
//! The `core` crate contains no database dependencies; the store adapter
//! loads rows and hands them over as a [`Dataset`] snapshot. Every report is
//! computed from exactly one snapshot, so two computations over the same
//! snapshot always agree.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Task status
// ---------------------------------------------------------------------------

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Incomplete,
    Unlabeled,
    Labeled,
    Draft,
    Skipped,
    Accepted,
    AcceptedWithChanges,
    ToBeRevised,
    Annotated,
    Reviewed,
    Exported,
    SuperChecked,
    Freezed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::Unlabeled => "unlabeled",
            Self::Labeled => "labeled",
            Self::Draft => "draft",
            Self::Skipped => "skipped",
            Self::Accepted => "accepted",
            Self::AcceptedWithChanges => "accepted_with_changes",
            Self::ToBeRevised => "to_be_revised",
            Self::Annotated => "annotated",
            Self::Reviewed => "reviewed",
            Self::Exported => "exported",
            Self::SuperChecked => "super_checked",
            Self::Freezed => "freezed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incomplete" => Ok(Self::Incomplete),
            "unlabeled" => Ok(Self::Unlabeled),
            "labeled" => Ok(Self::Labeled),
            "draft" => Ok(Self::Draft),
            "skipped" => Ok(Self::Skipped),
            "accepted" => Ok(Self::Accepted),
            "accepted_with_changes" => Ok(Self::AcceptedWithChanges),
            "to_be_revised" => Ok(Self::ToBeRevised),
            "annotated" => Ok(Self::Annotated),
            "reviewed" => Ok(Self::Reviewed),
            "exported" => Ok(Self::Exported),
            "super_checked" => Ok(Self::SuperChecked),
            "freezed" => Ok(Self::Freezed),
            _ => Err(CoreError::Validation(format!("Invalid task status '{s}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Annotation type and status
// ---------------------------------------------------------------------------

/// Which pipeline stage produced an annotation. Stored as SMALLINT 1..=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationType {
    Annotator,
    Reviewer,
    SuperChecker,
}

impl TryFrom<i16> for AnnotationType {
    type Error = CoreError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Annotator),
            2 => Ok(Self::Reviewer),
            3 => Ok(Self::SuperChecker),
            other => Err(CoreError::Validation(format!(
                "Invalid annotation type {other}. Must be 1, 2 or 3"
            ))),
        }
    }
}

/// Status of a single annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationStatus {
    Unlabeled,
    Labeled,
    Skipped,
    Draft,
    ToBeRevised,
    Accepted,
    AcceptedWithMinorChanges,
    AcceptedWithMajorChanges,
    Rejected,
    Validated,
    ValidatedWithChanges,
    Unvalidated,
}

/// Reviewer statuses that count as an acceptance.
pub const ACCEPTED_STATUSES: &[AnnotationStatus] = &[
    AnnotationStatus::Accepted,
    AnnotationStatus::AcceptedWithMinorChanges,
    AnnotationStatus::AcceptedWithMajorChanges,
];

/// Super-checker statuses that count as a validation.
pub const VALIDATED_STATUSES: &[AnnotationStatus] = &[
    AnnotationStatus::Validated,
    AnnotationStatus::ValidatedWithChanges,
];

impl AnnotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unlabeled => "unlabeled",
            Self::Labeled => "labeled",
            Self::Skipped => "skipped",
            Self::Draft => "draft",
            Self::ToBeRevised => "to_be_revised",
            Self::Accepted => "accepted",
            Self::AcceptedWithMinorChanges => "accepted_with_minor_changes",
            Self::AcceptedWithMajorChanges => "accepted_with_major_changes",
            Self::Rejected => "rejected",
            Self::Validated => "validated",
            Self::ValidatedWithChanges => "validated_with_changes",
            Self::Unvalidated => "unvalidated",
        }
    }

    pub fn is_accepted(&self) -> bool {
        ACCEPTED_STATUSES.contains(self)
    }

    pub fn is_validated(&self) -> bool {
        VALIDATED_STATUSES.contains(self)
    }
}

impl FromStr for AnnotationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unlabeled" => Ok(Self::Unlabeled),
            "labeled" => Ok(Self::Labeled),
            "skipped" => Ok(Self::Skipped),
            "draft" => Ok(Self::Draft),
            "to_be_revised" => Ok(Self::ToBeRevised),
            "accepted" => Ok(Self::Accepted),
            "accepted_with_minor_changes" => Ok(Self::AcceptedWithMinorChanges),
            "accepted_with_major_changes" => Ok(Self::AcceptedWithMajorChanges),
            "rejected" => Ok(Self::Rejected),
            "validated" => Ok(Self::Validated),
            "validated_with_changes" => Ok(Self::ValidatedWithChanges),
            "unvalidated" => Ok(Self::Unvalidated),
            _ => Err(CoreError::Validation(format!(
                "Invalid annotation status '{s}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Project stage
// ---------------------------------------------------------------------------

/// Furthest pipeline stage a project is configured for.
///
/// Ordered: `Annotation < Review < SuperCheck`. Serialized as the integer
/// code used by clients and the store (1, 2, 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum ProjectStage {
    Annotation,
    Review,
    SuperCheck,
}

impl ProjectStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Annotation => "Annotation",
            Self::Review => "Review",
            Self::SuperCheck => "Super Check",
        }
    }
}

impl TryFrom<i16> for ProjectStage {
    type Error = CoreError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Annotation),
            2 => Ok(Self::Review),
            3 => Ok(Self::SuperCheck),
            other => Err(CoreError::Validation(format!(
                "Invalid project stage {other}. Must be 1 (annotation), 2 (review) or 3 (super-check)"
            ))),
        }
    }
}

impl From<ProjectStage> for i16 {
    fn from(stage: ProjectStage) -> Self {
        match stage {
            ProjectStage::Annotation => 1,
            ProjectStage::Review => 2,
            ProjectStage::SuperCheck => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Employment arrangement of a user, as shown in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum ParticipationType {
    FullTime,
    PartTime,
    NotApplicable,
    ContractBasis,
}

impl ParticipationType {
    /// Lenient mapping for stored rows: unknown codes render as "N/A".
    pub fn from_code(code: Option<i16>) -> Self {
        code.and_then(|c| Self::try_from(c).ok())
            .unwrap_or(Self::NotApplicable)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FullTime => "Full Time",
            Self::PartTime => "Part Time",
            Self::NotApplicable => "N/A",
            Self::ContractBasis => "Contract Basis",
        }
    }
}

impl TryFrom<i16> for ParticipationType {
    type Error = CoreError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::FullTime),
            2 => Ok(Self::PartTime),
            3 => Ok(Self::NotApplicable),
            4 => Ok(Self::ContractBasis),
            other => Err(CoreError::Validation(format!(
                "Invalid participation type {other}. Must be one of: 1, 2, 3, 4"
            ))),
        }
    }
}

impl From<ParticipationType> for i16 {
    fn from(p: ParticipationType) -> Self {
        match p {
            ParticipationType::FullTime => 1,
            ParticipationType::PartTime => 2,
            ParticipationType::NotApplicable => 3,
            ParticipationType::ContractBasis => 4,
        }
    }
}

/// Human-readable name for a stored role code.
pub fn role_name(role: i16) -> &'static str {
    match role {
        1 => "Annotator",
        2 => "Reviewer",
        3 => "Super Checker",
        4 => "Workspace Manager",
        5 => "Organization Owner",
        6 => "Admin",
        _ => "Unknown",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub role: i16,
    pub participation_type: ParticipationType,
    pub languages: Vec<String>,
    pub organization_id: Option<DbId>,
}

impl UserRecord {
    pub fn speaks(&self, language: &str) -> bool {
        self.languages.iter().any(|l| l == language)
    }
}

// ---------------------------------------------------------------------------
// Organizations, workspaces, projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationRecord {
    pub id: DbId,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceRecord {
    pub id: DbId,
    pub organization_id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectRecord {
    pub id: DbId,
    pub title: String,
    pub workspace_id: DbId,
    pub organization_id: DbId,
    pub project_type: String,
    pub project_stage: ProjectStage,
    pub tgt_language: Option<String>,
    /// Maximum number of super-check rejections before a task is frozen.
    pub revision_loop_limit: i32,
    pub annotators: Vec<DbId>,
    pub reviewers: Vec<DbId>,
    pub super_checkers: Vec<DbId>,
}

// ---------------------------------------------------------------------------
// Tasks and annotations
// ---------------------------------------------------------------------------

/// How many times a task bounced back from each downstream stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionLoops {
    #[serde(default)]
    pub review_count: i32,
    #[serde(default)]
    pub super_check_count: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub id: DbId,
    pub project_id: DbId,
    pub status: TaskStatus,
    /// Free-form payload (`word_count`, `audio_duration`, input text...).
    pub data: serde_json::Value,
    pub annotation_users: Vec<DbId>,
    pub review_user: Option<DbId>,
    pub super_check_user: Option<DbId>,
    pub correct_annotation_id: Option<DbId>,
    pub revision_loops: RevisionLoops,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotationRecord {
    pub id: DbId,
    pub task_id: DbId,
    pub annotation_type: AnnotationType,
    pub status: AnnotationStatus,
    pub completed_by: Option<DbId>,
    pub parent_annotation_id: Option<DbId>,
    /// Seconds spent producing the annotation.
    pub lead_time: Option<f64>,
    pub result: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Immutable point-in-time snapshot of the store for one report scope.
///
/// All maps are ordered by id so iteration (and therefore every report built
/// on top) is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    organizations: BTreeMap<DbId, OrganizationRecord>,
    workspaces: BTreeMap<DbId, WorkspaceRecord>,
    users: BTreeMap<DbId, UserRecord>,
    projects: BTreeMap<DbId, ProjectRecord>,
    tasks: BTreeMap<DbId, TaskRecord>,
    annotations: BTreeMap<DbId, AnnotationRecord>,
    annotations_by_task: BTreeMap<DbId, Vec<DbId>>,
    children_by_parent: BTreeMap<DbId, Vec<DbId>>,
}

impl Dataset {
    pub fn new(
        organizations: Vec<OrganizationRecord>,
        workspaces: Vec<WorkspaceRecord>,
        users: Vec<UserRecord>,
        projects: Vec<ProjectRecord>,
        tasks: Vec<TaskRecord>,
        annotations: Vec<AnnotationRecord>,
    ) -> Self {
        let annotations: BTreeMap<DbId, AnnotationRecord> =
            annotations.into_iter().map(|a| (a.id, a)).collect();

        let mut annotations_by_task: BTreeMap<DbId, Vec<DbId>> = BTreeMap::new();
        let mut children_by_parent: BTreeMap<DbId, Vec<DbId>> = BTreeMap::new();
        for a in annotations.values() {
            annotations_by_task.entry(a.task_id).or_default().push(a.id);
            if let Some(parent) = a.parent_annotation_id {
                children_by_parent.entry(parent).or_default().push(a.id);
            }
        }

        Self {
            organizations: organizations.into_iter().map(|o| (o.id, o)).collect(),
            workspaces: workspaces.into_iter().map(|w| (w.id, w)).collect(),
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            projects: projects.into_iter().map(|p| (p.id, p)).collect(),
            tasks: tasks.into_iter().map(|t| (t.id, t)).collect(),
            annotations,
            annotations_by_task,
            children_by_parent,
        }
    }

    // -- lookups ------------------------------------------------------------

    pub fn user(&self, id: DbId) -> Result<&UserRecord, CoreError> {
        self.users
            .get(&id)
            .ok_or(CoreError::NotFound { entity: "User", id })
    }

    pub fn workspace(&self, id: DbId) -> Result<&WorkspaceRecord, CoreError> {
        self.workspaces
            .get(&id)
            .ok_or(CoreError::NotFound { entity: "Workspace", id })
    }

    pub fn organization(&self, id: DbId) -> Result<&OrganizationRecord, CoreError> {
        self.organizations
            .get(&id)
            .ok_or(CoreError::NotFound { entity: "Organization", id })
    }

    pub fn project(&self, id: DbId) -> Option<&ProjectRecord> {
        self.projects.get(&id)
    }

    pub fn task(&self, id: DbId) -> Option<&TaskRecord> {
        self.tasks.get(&id)
    }

    pub fn annotation(&self, id: DbId) -> Option<&AnnotationRecord> {
        self.annotations.get(&id)
    }

    // -- iteration ----------------------------------------------------------

    pub fn users(&self) -> impl Iterator<Item = &UserRecord> {
        self.users.values()
    }

    pub fn projects(&self) -> impl Iterator<Item = &ProjectRecord> {
        self.projects.values()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &TaskRecord> {
        self.tasks.values()
    }

    pub fn annotations(&self) -> impl Iterator<Item = &AnnotationRecord> {
        self.annotations.values()
    }

    /// Tasks belonging to any of the given projects, in id order.
    pub fn tasks_in<'a>(
        &'a self,
        project_ids: &'a BTreeSet<DbId>,
    ) -> impl Iterator<Item = &'a TaskRecord> + 'a {
        self.tasks
            .values()
            .filter(move |t| project_ids.contains(&t.project_id))
    }

    /// Annotations recorded against a task, in id order.
    pub fn annotations_of(&self, task_id: DbId) -> impl Iterator<Item = &AnnotationRecord> {
        self.annotations_by_task
            .get(&task_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.annotations.get(id))
    }

    /// Annotations whose `parent_annotation_id` points at `annotation_id`.
    pub fn children_of(&self, annotation_id: DbId) -> impl Iterator<Item = &AnnotationRecord> {
        self.children_by_parent
            .get(&annotation_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.annotations.get(id))
    }

    pub fn parent_of(&self, annotation: &AnnotationRecord) -> Option<&AnnotationRecord> {
        annotation
            .parent_annotation_id
            .and_then(|id| self.annotations.get(&id))
    }

    pub fn task_of(&self, annotation: &AnnotationRecord) -> Option<&TaskRecord> {
        self.tasks.get(&annotation.task_id)
    }

    pub fn project_of(&self, task: &TaskRecord) -> Option<&ProjectRecord> {
        self.projects.get(&task.project_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::DatasetBuilder;
    use assert_matches::assert_matches;

    #[test]
    fn task_status_round_trips_through_str() {
        for status in [
            TaskStatus::Unlabeled,
            TaskStatus::AcceptedWithChanges,
            TaskStatus::SuperChecked,
            TaskStatus::Freezed,
        ] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_annotation_status_rejected() {
        let err = "approved".parse::<AnnotationStatus>().unwrap_err();
        assert!(err.to_string().contains("Invalid annotation status"));
    }

    #[test]
    fn project_stage_is_ordered() {
        assert!(ProjectStage::Annotation < ProjectStage::Review);
        assert!(ProjectStage::Review < ProjectStage::SuperCheck);
    }

    #[test]
    fn project_stage_deserializes_from_integer_code() {
        let stage: ProjectStage = serde_json::from_str("3").unwrap();
        assert_eq!(stage, ProjectStage::SuperCheck);
        assert!(serde_json::from_str::<ProjectStage>("7").is_err());
    }

    #[test]
    fn participation_type_unknown_code_renders_na() {
        assert_eq!(ParticipationType::from_code(Some(9)).label(), "N/A");
        assert_eq!(ParticipationType::from_code(None).label(), "N/A");
        assert_eq!(ParticipationType::from_code(Some(4)).label(), "Contract Basis");
    }

    #[test]
    fn dataset_indexes_children_and_task_annotations() {
        let mut b = DatasetBuilder::new();
        let p = b.project(ProjectStage::SuperCheck, "AudioTranscription", Some("Hindi"));
        let t = b.task(p, TaskStatus::SuperChecked);
        let a = b.annotation(t, AnnotationType::Annotator, AnnotationStatus::Labeled, 1);
        let r = b.child(a, AnnotationType::Reviewer, AnnotationStatus::Accepted, 2);
        let s = b.child(r, AnnotationType::SuperChecker, AnnotationStatus::Validated, 3);
        let ds = b.build();

        let ids: Vec<DbId> = ds.annotations_of(t).map(|a| a.id).collect();
        assert_eq!(ids, vec![a, r, s]);
        let children: Vec<DbId> = ds.children_of(r).map(|a| a.id).collect();
        assert_eq!(children, vec![s]);
        assert_eq!(ds.parent_of(ds.annotation(s).unwrap()).unwrap().id, r);
    }

    #[test]
    fn missing_user_is_not_found() {
        let ds = DatasetBuilder::new().build();
        let err = ds.user(42).unwrap_err();
        assert_matches!(err, CoreError::NotFound { entity: "User", id: 42 });
    }
}
