use serde::{Deserialize, Serialize};

/// A GraphQL-style connection: `{ "nodes": [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<T> From<Vec<T>> for Connection<T> {
    fn from(nodes: Vec<T>) -> Self {
        Self { nodes }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub name: String,
}

/// A lightweight `{id, name}` reference to a user, team or project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl EntityRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "nullable_connection")]
    pub labels: Connection<Label>,
    #[serde(default, deserialize_with = "nullable_connection")]
    pub teams: Connection<EntityRef>,
}

impl Project {
    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels.nodes.iter().map(|l| l.name.as_str())
    }

    pub fn team_ids(&self) -> impl Iterator<Item = &str> {
        self.teams.nodes.iter().map(|t| t.id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_estimate")]
    pub estimate: Option<u32>,
    #[serde(default)]
    pub assignee: Option<EntityRef>,
    #[serde(default)]
    pub team: Option<EntityRef>,
    #[serde(default)]
    pub project: Option<EntityRef>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub state: Option<WorkflowState>,
    #[serde(default, deserialize_with = "nullable_connection")]
    pub labels: Connection<Label>,
}

impl Issue {
    /// The estimate, if present and nonzero.
    pub fn nonzero_estimate(&self) -> Option<u32> {
        self.estimate.filter(|&e| e > 0)
    }

    /// Point value with the presence floor: a missing or zero estimate counts as 1.
    pub fn points(&self) -> u64 {
        self.nonzero_estimate().map_or(1, u64::from)
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Completion timestamp if present, else creation timestamp.
    pub fn reference_timestamp(&self) -> Option<&str> {
        self.completed_at
            .as_deref()
            .or(self.created_at.as_deref())
    }

    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels.nodes.iter().map(|l| l.name.as_str())
    }

    pub fn state_name(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.name.as_str())
    }

    pub fn team_id(&self) -> Option<&str> {
        self.team.as_ref().map(|t| t.id.as_str())
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.id.as_str())
    }
}

/// Everything one invocation works on: flat team, project and issue lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// Treat an explicit `null` connection the same as a missing one.
fn nullable_connection<'de, D, T>(deserializer: D) -> std::result::Result<Connection<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Connection<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept integer or float estimates. Fractions round to the nearest point;
/// negative, non-finite or non-numeric values are treated as missing.
fn lenient_estimate<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::Number(n)) => match n.as_u64() {
            Some(points) => Some(u32::try_from(points).unwrap_or(u32::MAX)),
            None => n
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.round().min(f64::from(u32::MAX)) as u32),
        },
        Some(other) => {
            log::debug!("Ignoring non-numeric estimate {other}");
            None
        }
    })
}
