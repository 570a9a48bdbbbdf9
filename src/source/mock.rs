use crate::error::{Error, Result};
use crate::model::{Issue, Project, Snapshot, Team};

use super::{DataSource, FetchConfig};

/// In-memory source returning canned collections, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    snapshot: Snapshot,
    config: FetchConfig,
    failure: Option<String>,
}

impl MockSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            ..Default::default()
        }
    }

    pub fn with_config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    /// Make every fetch fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    fn check(&self) -> Result<()> {
        match &self.failure {
            Some(msg) => Err(Error::Source(msg.clone())),
            None => Ok(()),
        }
    }
}

impl DataSource for MockSource {
    fn teams(&self) -> Result<Vec<Team>> {
        self.check()?;
        Ok(self.snapshot.teams.clone())
    }

    fn projects(&self) -> Result<Vec<Project>> {
        self.check()?;
        Ok(self.snapshot.projects.clone())
    }

    fn issues(&self) -> Result<Vec<Issue>> {
        self.check()?;
        Ok(self.config.limit_issues(self.snapshot.issues.clone()))
    }
}
