use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{Issue, Project, Snapshot, Team};

use super::{DataSource, FetchConfig};

/// Reads teams, projects and issues from a JSON export of the tracker.
///
/// Accepted layouts, optionally wrapped in a top-level `"data"` object as
/// GraphQL responses are:
///
/// ```json
/// { "teams": [...], "projects": [...], "issues": [...] }
/// { "teams": { "nodes": [...] }, "projects": { "nodes": [...] }, "issues": { "nodes": [...] } }
/// ```
///
/// A missing or `null` collection is empty.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    snapshot: Snapshot,
    config: FetchConfig,
}

impl SnapshotSource {
    /// Load and decode the snapshot file at `path`.
    pub fn open(path: impl AsRef<Path>, config: FetchConfig) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Source(format!("cannot read snapshot {}: {e}", path.display()))
        })?;
        log::info!("Loading snapshot from {}", path.display());
        Self::from_json_str(&text, config)
    }

    pub fn from_json_str(text: &str, config: FetchConfig) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value, config)
    }

    pub fn from_value(mut value: Value, config: FetchConfig) -> Result<Self> {
        if let Some(data) = value.get_mut("data").map(Value::take) {
            value = data;
        }
        if !value.is_object() {
            return Err(Error::Source(
                "snapshot root must be a JSON object".to_string(),
            ));
        }

        let snapshot = Snapshot {
            teams: decode_collection(&mut value, "teams", &config)?,
            projects: decode_collection(&mut value, "projects", &config)?,
            issues: decode_collection(&mut value, "issues", &config)?,
        };
        log::debug!(
            "Snapshot decoded: {} teams, {} projects, {} issues",
            snapshot.teams.len(),
            snapshot.projects.len(),
            snapshot.issues.len()
        );
        Ok(Self { snapshot, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

impl DataSource for SnapshotSource {
    fn teams(&self) -> Result<Vec<Team>> {
        Ok(self.snapshot.teams.clone())
    }

    fn projects(&self) -> Result<Vec<Project>> {
        Ok(self.snapshot.projects.clone())
    }

    fn issues(&self) -> Result<Vec<Issue>> {
        Ok(self.config.limit_issues(self.snapshot.issues.clone()))
    }
}

/// Decode `root[key]` as a list of records, accepting a plain array or a
/// `{ "nodes": [...] }` connection.
fn decode_collection<T: DeserializeOwned>(
    root: &mut Value,
    key: &str,
    config: &FetchConfig,
) -> Result<Vec<T>> {
    let raw = match root.get_mut(key).map(Value::take) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(mut obj)) => obj.remove("nodes").unwrap_or(Value::Null),
        Some(other) => other,
    };
    let items = match raw {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            return Err(Error::Source(format!(
                "expected a list of {key}, found {}",
                json_kind(&other)
            )))
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(record) => records.push(record),
            Err(e) if config.safe_mode => {
                log::warn!("Skipping malformed {key} record #{index}: {e}");
            }
            Err(e) => {
                return Err(Error::Source(format!(
                    "malformed {key} record #{index}: {e}"
                )))
            }
        }
    }
    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
