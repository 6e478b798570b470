//! Integration tests for snapshot loading.
//!
//! Seeds a small organization with raw SQL, then checks that each report
//! scope loads the rows it needs and that the loaded dataset feeds the
//! report layer. Requires a PostgreSQL `DATABASE_URL`.

use annostat_core::records::{AnnotationStatus, ProjectStage, TaskStatus};
use annostat_core::reports::LanguageQuery;
use annostat_core::stage::Stage;
use annostat_core::{compute_report, ReportRequest, ReportScope};
use annostat_db::snapshot::SnapshotLoader;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Seed {
    organization: i64,
    workspace: i64,
    annotator: i64,
    reviewer: i64,
    project: i64,
}

async fn insert_id(pool: &PgPool, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await.unwrap()
}

async fn seed(pool: &PgPool) -> Seed {
    let organization =
        insert_id(pool, "INSERT INTO organizations (title) VALUES ('Acme') RETURNING id").await;
    let workspace = insert_id(
        pool,
        &format!(
            "INSERT INTO workspaces (organization_id, name) VALUES ({organization}, 'News') \
             RETURNING id"
        ),
    )
    .await;
    let annotator = insert_id(
        pool,
        &format!(
            "INSERT INTO users (username, email, role, participation_type, languages, organization_id) \
             VALUES ('asha', 'asha@example.com', 1, 1, ARRAY['Hindi'], {organization}) RETURNING id"
        ),
    )
    .await;
    let reviewer = insert_id(
        pool,
        &format!(
            "INSERT INTO users (username, email, role, languages, organization_id) \
             VALUES ('ravi', 'ravi@example.com', 2, ARRAY['Hindi'], {organization}) RETURNING id"
        ),
    )
    .await;
    let project = insert_id(
        pool,
        &format!(
            "INSERT INTO projects (title, workspace_id, organization_id, project_type, project_stage, tgt_language) \
             VALUES ('Headlines', {workspace}, {organization}, 'ContextualTranslationEditing', 2, 'Hindi') \
             RETURNING id"
        ),
    )
    .await;
    sqlx::query(&format!(
        "INSERT INTO project_members (project_id, user_id, role) \
         VALUES ({project}, {annotator}, 1), ({project}, {reviewer}, 2)"
    ))
    .execute(pool)
    .await
    .unwrap();

    let task = insert_id(
        pool,
        &format!(
            "INSERT INTO tasks (project_id, task_status, data, review_user_id) \
             VALUES ({project}, 'reviewed', '{{\"word_count\": 12}}', {reviewer}) RETURNING id"
        ),
    )
    .await;
    sqlx::query(&format!(
        "INSERT INTO task_annotation_users (task_id, user_id) VALUES ({task}, {annotator})"
    ))
    .execute(pool)
    .await
    .unwrap();
    let parent = insert_id(
        pool,
        &format!(
            "INSERT INTO annotations (task_id, annotation_type, annotation_status, completed_by, lead_time) \
             VALUES ({task}, 1, 'labeled', {annotator}, 30.0) RETURNING id"
        ),
    )
    .await;
    sqlx::query(&format!(
        "INSERT INTO annotations (task_id, annotation_type, annotation_status, completed_by, parent_annotation_id) \
         VALUES ({task}, 2, 'accepted', {reviewer}, {parent})"
    ))
    .execute(pool)
    .await
    .unwrap();

    Seed {
        organization,
        workspace,
        annotator,
        reviewer,
        project,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn workspace_scope_loads_full_hierarchy(pool: PgPool) {
    let seed = seed(&pool).await;
    let dataset = SnapshotLoader::load(&pool, ReportScope::Workspace(seed.workspace))
        .await
        .unwrap();

    assert!(dataset.workspace(seed.workspace).is_ok());
    assert!(dataset.organization(seed.organization).is_ok());
    assert!(dataset.user(seed.annotator).is_ok());

    let project = dataset.project(seed.project).unwrap();
    assert_eq!(project.project_stage, ProjectStage::Review);
    assert_eq!(project.annotators, vec![seed.annotator]);
    assert_eq!(project.reviewers, vec![seed.reviewer]);

    let task = dataset.tasks().next().unwrap();
    assert_eq!(task.status, TaskStatus::Reviewed);
    assert_eq!(task.annotation_users, vec![seed.annotator]);

    let review = dataset
        .annotations()
        .find(|a| a.parent_annotation_id.is_some())
        .unwrap();
    assert_eq!(review.status, AnnotationStatus::Accepted);
    assert_eq!(dataset.parent_of(review).unwrap().lead_time, Some(30.0));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn user_scope_includes_assigned_projects(pool: PgPool) {
    let seed = seed(&pool).await;
    let dataset = SnapshotLoader::load(&pool, ReportScope::User(seed.reviewer))
        .await
        .unwrap();

    assert!(dataset.project(seed.project).is_some());
    assert!(dataset.user(seed.reviewer).is_ok());
    assert!(dataset.user(seed.annotator).is_ok());
    assert_eq!(dataset.annotations().count(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_scope_root_loads_empty_dataset(pool: PgPool) {
    let dataset = SnapshotLoader::load(&pool, ReportScope::Organization(9_999))
        .await
        .unwrap();
    assert!(dataset.organization(9_999).is_err());
    assert_eq!(dataset.projects().count(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn loaded_snapshot_feeds_reports(pool: PgPool) {
    let seed = seed(&pool).await;
    let request = ReportRequest::CumulativeByLanguage(LanguageQuery {
        workspace_id: seed.workspace,
        project_type: "ContextualTranslationEditing".into(),
        stage: Stage::Annotation,
        metainfo: true,
    });
    let dataset = SnapshotLoader::load(&pool, request.scope()).await.unwrap();
    let report = compute_report(&dataset, &request).unwrap();
    assert_eq!(report.row_count(), 1);
}
