use indexmap::IndexMap;
use serde::Serialize;

use crate::model::{Issue, Project, Team};

/// Completed vs. total issues for one group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompletionRate {
    pub total: u64,
    pub completed: u64,
    /// `completed / total * 100`, 2 decimals, 0 for an empty group.
    pub rate: f64,
}

/// Capitalized vs. total issues for one team.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamCapitalization {
    pub total: u64,
    pub capitalized: u64,
    pub capitalization_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CapitalizationMetrics {
    pub total_issues: u64,
    pub capitalized_issues: u64,
    pub capitalization_rate: f64,
    /// Keyed by team name.
    pub by_team: IndexMap<String, TeamCapitalization>,
    /// Names of projects carrying a capitalization label, in input order.
    pub capitalized_projects: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    pub teams_count: usize,
    pub projects_count: usize,
    pub issues_count: usize,
    pub issues_by_status: IndexMap<String, u64>,
    pub issues_by_team: IndexMap<String, u64>,
    pub team_completion_rates: IndexMap<String, CompletionRate>,
    pub capitalization_metrics: CapitalizationMetrics,
}

/// The full report handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub teams: Vec<Team>,
    pub projects: Vec<Project>,
    pub issues: Vec<Issue>,
    pub summary: ReportSummary,
}
