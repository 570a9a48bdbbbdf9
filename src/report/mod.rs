pub mod types;

pub use types::*;

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::model::{Issue, Project, Team};
use crate::workload::percentage;

/// Histogram key for issues missing the grouped field.
pub const UNKNOWN: &str = "Unknown";

/// Label names (compared case-insensitively) that mark work as capital expenditure.
pub const CAPITALIZATION_LABELS: [&str; 3] = ["capitalization", "capex", "fixed asset"];

/// Fields an issue histogram can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueField {
    Status,
    Team,
    Project,
    Assignee,
}

impl IssueField {
    fn value(self, issue: &Issue) -> Option<&str> {
        match self {
            IssueField::Status => issue.state_name(),
            IssueField::Team => issue.team.as_ref().map(|t| t.name.as_str()),
            IssueField::Project => issue.project.as_ref().map(|p| p.name.as_str()),
            IssueField::Assignee => issue.assignee.as_ref().map(|a| a.name.as_str()),
        }
    }
}

/// Count issues per value of `field`; missing values count under [`UNKNOWN`].
pub fn count_by<'a, I>(issues: I, field: IssueField) -> IndexMap<String, u64>
where
    I: IntoIterator<Item = &'a Issue>,
{
    let mut counts: IndexMap<String, u64> = IndexMap::new();
    for issue in issues {
        let key = field.value(issue).unwrap_or(UNKNOWN);
        *counts.entry(key.to_string()).or_default() += 1;
    }
    counts
}

fn team_name(issue: &Issue) -> &str {
    IssueField::Team.value(issue).unwrap_or(UNKNOWN)
}

/// Per team name: total issues, completed issues and completion rate.
pub fn completion_rates<'a, I>(issues: I) -> IndexMap<String, CompletionRate>
where
    I: IntoIterator<Item = &'a Issue>,
{
    let mut rates: IndexMap<String, CompletionRate> = IndexMap::new();
    for issue in issues {
        let entry = rates.entry(team_name(issue).to_string()).or_default();
        entry.total += 1;
        if issue.is_completed() {
            entry.completed += 1;
        }
    }
    for entry in rates.values_mut() {
        entry.rate = percentage(entry.completed, entry.total);
    }
    rates
}

/// True if any label matches the capitalization vocabulary.
pub fn has_capitalization_label<'a>(labels: impl IntoIterator<Item = &'a str>) -> bool {
    labels.into_iter().any(|label| {
        let label = label.trim().to_lowercase();
        CAPITALIZATION_LABELS.contains(&label.as_str())
    })
}

/// Decides capitalization per issue. A project's labels win over the issue's own:
/// issues inside a project are capitalized only if the project is, and only
/// issues without a project fall back to their own labels.
#[derive(Debug)]
pub struct CapitalizationClassifier<'a> {
    project_capitalized: HashMap<&'a str, bool>,
}

impl<'a> CapitalizationClassifier<'a> {
    pub fn new(projects: &'a [Project]) -> Self {
        let project_capitalized = projects
            .iter()
            .map(|p| (p.id.as_str(), has_capitalization_label(p.label_names())))
            .collect();
        Self { project_capitalized }
    }

    pub fn is_capitalized(&self, issue: &Issue) -> bool {
        match issue.project_id() {
            Some(pid) => self.project_capitalized.get(pid).copied().unwrap_or(false),
            None => has_capitalization_label(issue.label_names()),
        }
    }
}

/// Overall and per-team capitalization counts plus the capitalized project names.
pub fn capitalization_metrics<'a, I>(issues: I, projects: &[Project]) -> CapitalizationMetrics
where
    I: IntoIterator<Item = &'a Issue>,
{
    let classifier = CapitalizationClassifier::new(projects);
    let mut metrics = CapitalizationMetrics::default();

    for issue in issues {
        let capitalized = classifier.is_capitalized(issue);
        metrics.total_issues += 1;
        let team = metrics
            .by_team
            .entry(team_name(issue).to_string())
            .or_default();
        team.total += 1;
        if capitalized {
            metrics.capitalized_issues += 1;
            team.capitalized += 1;
        }
    }

    metrics.capitalization_rate = percentage(metrics.capitalized_issues, metrics.total_issues);
    for team in metrics.by_team.values_mut() {
        team.capitalization_rate = percentage(team.capitalized, team.total);
    }

    for project in projects {
        if has_capitalization_label(project.label_names())
            && !metrics.capitalized_projects.contains(&project.name)
        {
            metrics.capitalized_projects.push(project.name.clone());
        }
    }

    log::debug!(
        "Capitalization: {}/{} issues, {} projects",
        metrics.capitalized_issues,
        metrics.total_issues,
        metrics.capitalized_projects.len()
    );
    metrics
}

/// Compose entity counts, histograms, completion and capitalization metrics.
pub fn generate_report(teams: &[Team], projects: &[Project], issues: &[Issue]) -> Report {
    let summary = ReportSummary {
        teams_count: teams.len(),
        projects_count: projects.len(),
        issues_count: issues.len(),
        issues_by_status: count_by(issues, IssueField::Status),
        issues_by_team: count_by(issues, IssueField::Team),
        team_completion_rates: completion_rates(issues),
        capitalization_metrics: capitalization_metrics(issues, projects),
    };

    Report {
        teams: teams.to_vec(),
        projects: projects.to_vec(),
        issues: issues.to_vec(),
        summary,
    }
}
