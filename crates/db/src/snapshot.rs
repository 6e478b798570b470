//! Point-in-time snapshot loading.
//!
//! A report never reads the store piecemeal: [`SnapshotLoader::load`] pulls
//! every row a [`ReportScope`] can touch inside one `REPEATABLE READ, READ
//! ONLY` transaction and hands the pure computation layer an immutable
//! [`Dataset`]. Concurrent writers therefore cannot skew the numbers within
//! one report.

use std::collections::{BTreeMap, BTreeSet};

use annostat_core::records::{
    AnnotationRecord, Dataset, OrganizationRecord, ProjectRecord, TaskRecord, UserRecord,
    WorkspaceRecord,
};
use annostat_core::types::DbId;
use annostat_core::ReportScope;
use sqlx::PgConnection;

use crate::models::project::{Project, ProjectMember};
use crate::models::task::Task;
use crate::repositories::{
    AnnotationRepo, OrganizationRepo, ProjectRepo, TaskRepo, UserRepo, WorkspaceRepo,
};
use crate::DbPool;

/// Loads report snapshots.
pub struct SnapshotLoader;

impl SnapshotLoader {
    /// Load every row reachable from `scope`.
    ///
    /// A missing root entity yields an empty dataset; the report layer turns
    /// that into a not-found error with the right entity name.
    pub async fn load(pool: &DbPool, scope: ReportScope) -> Result<Dataset, sqlx::Error> {
        let started = std::time::Instant::now();
        let mut tx = pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let dataset = match scope {
            ReportScope::Workspace(id) => load_workspace(&mut *tx, id).await?,
            ReportScope::Organization(id) => load_organization(&mut *tx, id).await?,
            ReportScope::User(id) => load_user(&mut *tx, id).await?,
        };
        tx.commit().await?;

        tracing::debug!(
            ?scope,
            projects = dataset.projects().count(),
            tasks = dataset.tasks().count(),
            annotations = dataset.annotations().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Loaded report snapshot",
        );
        Ok(dataset)
    }
}

// ---------------------------------------------------------------------------
// Scopes
// ---------------------------------------------------------------------------

async fn load_workspace(conn: &mut PgConnection, workspace_id: DbId) -> Result<Dataset, sqlx::Error> {
    let Some(workspace) = WorkspaceRepo::find_by_id(conn, workspace_id).await? else {
        return Ok(Dataset::default());
    };
    let organizations = OrganizationRepo::list_by_ids(conn, &[workspace.organization_id]).await?;
    let projects = ProjectRepo::list_by_workspace(conn, workspace_id).await?;
    let organization_id = workspace.organization_id;

    let content = load_project_content(conn, projects).await?;
    let users = UserRepo::list_for_organization(conn, organization_id, &content.referenced_users())
        .await?;

    Ok(content.into_dataset(
        organizations.into_iter().map(Into::into).collect(),
        vec![workspace.into()],
        users.into_iter().map(Into::into).collect(),
    ))
}

async fn load_organization(
    conn: &mut PgConnection,
    organization_id: DbId,
) -> Result<Dataset, sqlx::Error> {
    let Some(organization) = OrganizationRepo::find_by_id(conn, organization_id).await? else {
        return Ok(Dataset::default());
    };
    let workspaces = WorkspaceRepo::list_by_organization(conn, organization_id).await?;
    let projects = ProjectRepo::list_by_organization(conn, organization_id).await?;

    let content = load_project_content(conn, projects).await?;
    let users = UserRepo::list_for_organization(conn, organization_id, &content.referenced_users())
        .await?;

    Ok(content.into_dataset(
        vec![organization.into()],
        workspaces.into_iter().map(Into::into).collect(),
        users.into_iter().map(Into::into).collect(),
    ))
}

async fn load_user(conn: &mut PgConnection, user_id: DbId) -> Result<Dataset, sqlx::Error> {
    if UserRepo::find_by_id(conn, user_id).await?.is_none() {
        return Ok(Dataset::default());
    }
    let projects = ProjectRepo::list_for_user(conn, user_id).await?;
    let workspace_ids: Vec<DbId> = unique(projects.iter().map(|p| p.workspace_id));
    let organization_ids: Vec<DbId> = unique(projects.iter().map(|p| p.organization_id));

    let workspaces = WorkspaceRepo::list_by_ids(conn, &workspace_ids).await?;
    let organizations = OrganizationRepo::list_by_ids(conn, &organization_ids).await?;
    let content = load_project_content(conn, projects).await?;

    let mut user_ids = content.referenced_users();
    user_ids.push(user_id);
    let users = UserRepo::list_by_ids(conn, &user_ids).await?;

    Ok(content.into_dataset(
        organizations.into_iter().map(Into::into).collect(),
        workspaces.into_iter().map(Into::into).collect(),
        users.into_iter().map(Into::into).collect(),
    ))
}

// ---------------------------------------------------------------------------
// Shared project loading
// ---------------------------------------------------------------------------

/// Projects with their tasks and annotations, already converted.
struct ProjectContent {
    projects: Vec<ProjectRecord>,
    tasks: Vec<TaskRecord>,
    annotations: Vec<AnnotationRecord>,
}

impl ProjectContent {
    /// Every user id a member list, assignment or annotation points at.
    fn referenced_users(&self) -> Vec<DbId> {
        let members = self
            .projects
            .iter()
            .flat_map(|p| p.annotators.iter().chain(&p.reviewers).chain(&p.super_checkers))
            .copied();
        let assignees = self.tasks.iter().flat_map(|t| {
            t.annotation_users
                .iter()
                .copied()
                .chain(t.review_user)
                .chain(t.super_check_user)
        });
        let authors = self.annotations.iter().filter_map(|a| a.completed_by);
        unique(members.chain(assignees).chain(authors))
    }

    fn into_dataset(
        self,
        organizations: Vec<OrganizationRecord>,
        workspaces: Vec<WorkspaceRecord>,
        users: Vec<UserRecord>,
    ) -> Dataset {
        Dataset::new(
            organizations,
            workspaces,
            users,
            self.projects,
            self.tasks,
            self.annotations,
        )
    }
}

async fn load_project_content(
    conn: &mut PgConnection,
    projects: Vec<Project>,
) -> Result<ProjectContent, sqlx::Error> {
    let project_ids: Vec<DbId> = projects.iter().map(|p| p.id).collect();
    let members: Vec<ProjectMember> = ProjectRepo::list_members(conn, &project_ids).await?;
    let projects = projects
        .into_iter()
        .map(|p| p.into_record(&members))
        .collect::<Result<Vec<_>, _>>()?;

    let task_rows: Vec<Task> = TaskRepo::list_by_projects(conn, &project_ids).await?;
    let task_ids: Vec<DbId> = task_rows.iter().map(|t| t.id).collect();

    let mut assignments: BTreeMap<DbId, Vec<DbId>> = BTreeMap::new();
    for row in TaskRepo::list_annotation_users(conn, &task_ids).await? {
        assignments.entry(row.task_id).or_default().push(row.user_id);
    }
    let tasks = task_rows
        .into_iter()
        .map(|t| {
            let users = assignments.remove(&t.id).unwrap_or_default();
            t.into_record(users)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let annotations = AnnotationRepo::list_by_tasks(conn, &task_ids)
        .await?
        .into_iter()
        .map(AnnotationRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProjectContent {
        projects,
        tasks,
        annotations,
    })
}

fn unique(ids: impl Iterator<Item = DbId>) -> Vec<DbId> {
    ids.collect::<BTreeSet<_>>().into_iter().collect()
}
