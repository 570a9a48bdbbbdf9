use std::cmp::Reverse;

use indexmap::IndexMap;
use serde::Serialize;

use crate::model::EntityRef;

/// Project key for issues without a project.
pub const NO_PROJECT: &str = "no_project";
pub const NO_PROJECT_NAME: &str = "No Project";
/// Contributor key for issues without an assignee.
pub const UNASSIGNED: &str = "unassigned";
pub const UNASSIGNED_NAME: &str = "Unassigned";

/// Round to 2 decimal places.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// `part / total * 100`, rounded to 2 decimals; 0.0 when `total` is zero.
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        round2(part as f64 / total as f64 * 100.0)
    }
}

/// One leaf of a rollup: a contributor's slice of a project, or a project's
/// slice of a contributor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Share {
    pub name: String,
    pub points: u64,
    pub issue_count: u64,
    /// Share of the parent's `total_points`, set by the finishing pass.
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectWorkload {
    pub name: String,
    pub total_points: u64,
    pub issue_count: u64,
    pub contributors: IndexMap<String, Share>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContributorWorkload {
    pub name: String,
    pub total_points: u64,
    pub issue_count: u64,
    pub projects: IndexMap<String, Share>,
}

/// Workload for a single team: project → contributor and the transpose.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamWorkload {
    pub name: String,
    pub total_points: u64,
    pub issue_count: u64,
    pub projects: IndexMap<String, ProjectWorkload>,
    pub contributors: IndexMap<String, ContributorWorkload>,
}

/// Multi-team workload keyed by team id, in first-seen order.
pub type Workload = IndexMap<String, TeamWorkload>;

impl TeamWorkload {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Accumulate `points` for one issue into both directions of the rollup.
    pub fn add(&mut self, project: Option<&EntityRef>, assignee: Option<&EntityRef>, points: u64) {
        let (project_id, project_name) = match project {
            Some(p) => (p.id.as_str(), p.name.as_str()),
            None => (NO_PROJECT, NO_PROJECT_NAME),
        };
        let (contributor_id, contributor_name) = match assignee {
            Some(a) => (a.id.as_str(), a.name.as_str()),
            None => (UNASSIGNED, UNASSIGNED_NAME),
        };

        self.total_points += points;
        self.issue_count += 1;

        let proj = self
            .projects
            .entry(project_id.to_string())
            .or_insert_with(|| ProjectWorkload {
                name: project_name.to_string(),
                ..Default::default()
            });
        proj.total_points += points;
        proj.issue_count += 1;
        accumulate(&mut proj.contributors, contributor_id, contributor_name, points);

        let contrib = self
            .contributors
            .entry(contributor_id.to_string())
            .or_insert_with(|| ContributorWorkload {
                name: contributor_name.to_string(),
                ..Default::default()
            });
        contrib.total_points += points;
        contrib.issue_count += 1;
        accumulate(&mut contrib.projects, project_id, project_name, points);
    }

    /// Finishing pass: fill in every percentage against its parent total.
    pub fn finalize(&mut self) {
        for proj in self.projects.values_mut() {
            for share in proj.contributors.values_mut() {
                share.percentage = percentage(share.points, proj.total_points);
            }
        }
        for contrib in self.contributors.values_mut() {
            for share in contrib.projects.values_mut() {
                share.percentage = percentage(share.points, contrib.total_points);
            }
        }
    }

    /// Projects ordered by descending points (ties keep insertion order).
    pub fn projects_by_points(&self) -> Vec<(&String, &ProjectWorkload)> {
        let mut out: Vec<_> = self.projects.iter().collect();
        out.sort_by_key(|(_, p)| Reverse(p.total_points));
        out
    }

    /// Contributors ordered by descending points (ties keep insertion order).
    pub fn contributors_by_points(&self) -> Vec<(&String, &ContributorWorkload)> {
        let mut out: Vec<_> = self.contributors.iter().collect();
        out.sort_by_key(|(_, c)| Reverse(c.total_points));
        out
    }

    pub fn is_empty(&self) -> bool {
        self.issue_count == 0
    }
}

/// Shares ordered by descending points (ties keep insertion order).
pub fn shares_by_points(shares: &IndexMap<String, Share>) -> Vec<(&String, &Share)> {
    let mut out: Vec<_> = shares.iter().collect();
    out.sort_by_key(|(_, s)| Reverse(s.points));
    out
}

fn accumulate(shares: &mut IndexMap<String, Share>, id: &str, name: &str, points: u64) {
    let share = shares.entry(id.to_string()).or_insert_with(|| Share {
        name: name.to_string(),
        ..Default::default()
    });
    share.points += points;
    share.issue_count += 1;
}
