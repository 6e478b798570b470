//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// `?metainfo=true` switches language reports from task counts to word
/// count or audio duration.
#[derive(Debug, Default, Deserialize)]
pub struct MetainfoParams {
    #[serde(default)]
    pub metainfo: bool,
}

/// Query parameters of the all-types cumulative report.
#[derive(Debug, Default, Deserialize)]
pub struct AllTypesParams {
    #[serde(default)]
    pub metainfo: bool,
    /// Restricts the report to one project type instead of the default list.
    pub project_type: Option<String>,
}
