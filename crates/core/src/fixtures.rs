//! Test-only builder for small in-memory datasets.

use chrono::{Duration, NaiveDate, TimeZone, Utc};

use crate::records::{
    AnnotationRecord, AnnotationStatus, AnnotationType, Dataset, OrganizationRecord,
    ParticipationType, ProjectRecord, ProjectStage, RevisionLoops, TaskRecord, TaskStatus,
    UserRecord, WorkspaceRecord,
};
use crate::stage::Stage;
use crate::types::{Date, DbId, Timestamp};

pub const ORG: DbId = 1;
pub const WORKSPACE: DbId = 1;

/// Noon UTC on 2024-01-01 plus `n - 1` days.
pub fn day(n: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::days(n - 1)
}

pub fn date(s: &str) -> Date {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub struct DatasetBuilder {
    next_id: DbId,
    organizations: Vec<OrganizationRecord>,
    workspaces: Vec<WorkspaceRecord>,
    users: Vec<UserRecord>,
    projects: Vec<ProjectRecord>,
    tasks: Vec<TaskRecord>,
    annotations: Vec<AnnotationRecord>,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self {
            next_id: 100,
            organizations: vec![OrganizationRecord {
                id: ORG,
                title: "Acme".into(),
            }],
            workspaces: vec![WorkspaceRecord {
                id: WORKSPACE,
                organization_id: ORG,
                name: "Main".into(),
                created_at: day(1),
            }],
            users: Vec::new(),
            projects: Vec::new(),
            tasks: Vec::new(),
            annotations: Vec::new(),
        }
    }

    fn id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    pub fn user(&mut self, username: &str, participation: i16) -> DbId {
        let id = self.id();
        self.users.push(UserRecord {
            id,
            username: username.into(),
            email: format!("{username}@example.com"),
            role: 1,
            participation_type: ParticipationType::from_code(Some(participation)),
            languages: vec!["Hindi".into()],
            organization_id: Some(ORG),
        });
        id
    }

    pub fn user_mut(&mut self, id: DbId) -> &mut UserRecord {
        self.users.iter_mut().find(|u| u.id == id).unwrap()
    }

    pub fn project(&mut self, stage: ProjectStage, project_type: &str, lang: Option<&str>) -> DbId {
        let id = self.id();
        self.projects.push(ProjectRecord {
            id,
            title: format!("Project {id}"),
            workspace_id: WORKSPACE,
            organization_id: ORG,
            project_type: project_type.into(),
            project_stage: stage,
            tgt_language: lang.map(str::to_owned),
            revision_loop_limit: 2,
            annotators: Vec::new(),
            reviewers: Vec::new(),
            super_checkers: Vec::new(),
        });
        id
    }

    pub fn project_mut(&mut self, id: DbId) -> &mut ProjectRecord {
        self.projects.iter_mut().find(|p| p.id == id).unwrap()
    }

    pub fn member(&mut self, project: DbId, stage: Stage, user: DbId) {
        let p = self.project_mut(project);
        match stage {
            Stage::Annotation => p.annotators.push(user),
            Stage::Review => p.reviewers.push(user),
            Stage::SuperCheck => p.super_checkers.push(user),
        }
    }

    pub fn task(&mut self, project: DbId, status: TaskStatus) -> DbId {
        let id = self.id();
        self.tasks.push(TaskRecord {
            id,
            project_id: project,
            status,
            data: serde_json::json!({}),
            annotation_users: Vec::new(),
            review_user: None,
            super_check_user: None,
            correct_annotation_id: None,
            revision_loops: RevisionLoops::default(),
        });
        id
    }

    pub fn task_mut(&mut self, id: DbId) -> &mut TaskRecord {
        self.tasks.iter_mut().find(|t| t.id == id).unwrap()
    }

    pub fn annotation(
        &mut self,
        task: DbId,
        annotation_type: AnnotationType,
        status: AnnotationStatus,
        on_day: i64,
    ) -> DbId {
        let id = self.id();
        self.annotations.push(AnnotationRecord {
            id,
            task_id: task,
            annotation_type,
            status,
            completed_by: None,
            parent_annotation_id: None,
            lead_time: None,
            result: serde_json::json!([]),
            created_at: day(on_day),
            updated_at: day(on_day),
        });
        id
    }

    /// Annotation on the same task as `parent`, chained to it.
    pub fn child(
        &mut self,
        parent: DbId,
        annotation_type: AnnotationType,
        status: AnnotationStatus,
        on_day: i64,
    ) -> DbId {
        let task = self.annotation_mut(parent).task_id;
        let id = self.annotation(task, annotation_type, status, on_day);
        self.annotation_mut(id).parent_annotation_id = Some(parent);
        id
    }

    pub fn annotation_mut(&mut self, id: DbId) -> &mut AnnotationRecord {
        self.annotations.iter_mut().find(|a| a.id == id).unwrap()
    }

    pub fn build(self) -> Dataset {
        Dataset::new(
            self.organizations,
            self.workspaces,
            self.users,
            self.projects,
            self.tasks,
            self.annotations,
        )
    }
}

/// Transcription result with one labelled region and its text per segment.
pub fn transcription(segments: &[(f64, f64, &str)]) -> serde_json::Value {
    let mut items = Vec::new();
    for (i, (start, end, text)) in segments.iter().enumerate() {
        items.push(serde_json::json!({
            "id": format!("seg{i}"),
            "type": "labels",
            "value": { "start": start, "end": end, "labels": ["Speech"] }
        }));
        items.push(serde_json::json!({
            "id": format!("seg{i}"),
            "type": "textarea",
            "value": { "start": start, "end": end, "text": [text] }
        }));
    }
    serde_json::Value::Array(items)
}
