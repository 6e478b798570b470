//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async read methods that
//! accept `&mut PgConnection` as the first argument, so the snapshot loader
//! can run them all on one read-only transaction.

pub mod annotation_repo;
pub mod organization_repo;
pub mod project_repo;
pub mod task_repo;
pub mod user_repo;
pub mod workspace_repo;

pub use annotation_repo::AnnotationRepo;
pub use organization_repo::OrganizationRepo;
pub use project_repo::ProjectRepo;
pub use task_repo::TaskRepo;
pub use user_repo::UserRepo;
pub use workspace_repo::WorkspaceRepo;
