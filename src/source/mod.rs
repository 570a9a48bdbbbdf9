pub mod mock;
pub mod snapshot;

pub use mock::MockSource;
pub use snapshot::SnapshotSource;

use crate::error::Result;
use crate::model::{Issue, Project, Snapshot, Team};

/// Options handed to a data source when it is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Skip malformed records with a warning instead of failing the whole load.
    pub safe_mode: bool,
    /// Keep at most this many issues.
    pub issue_limit: Option<usize>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            safe_mode: true,
            issue_limit: None,
        }
    }
}

impl FetchConfig {
    pub(crate) fn limit_issues(&self, mut issues: Vec<Issue>) -> Vec<Issue> {
        if let Some(limit) = self.issue_limit {
            if issues.len() > limit {
                log::info!("Truncating {} issues to the configured limit of {limit}", issues.len());
                issues.truncate(limit);
            }
        }
        issues
    }
}

/// Where team, project and issue records come from.
///
/// Implementations return fully materialized collections; aggregation starts
/// only after all three have been fetched.
pub trait DataSource {
    fn teams(&self) -> Result<Vec<Team>>;
    fn projects(&self) -> Result<Vec<Project>>;
    fn issues(&self) -> Result<Vec<Issue>>;

    /// Fetch all three collections.
    fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            teams: self.teams()?,
            projects: self.projects()?,
            issues: self.issues()?,
        })
    }
}
