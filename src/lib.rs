pub mod config;
pub mod date_util;
pub mod error;
pub mod model;
pub mod query;
pub mod report;
pub mod source;
pub mod workload;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{EntityRef, Issue, Project, Snapshot, Team};
pub use query::period::{Period, PeriodFilter};
pub use report::{generate_report, Report};
pub use source::{DataSource, FetchConfig, MockSource, SnapshotSource};
pub use workload::{
    engineer_project_workload, team_project_workload, MonthlyProcessor, MonthlyRollup,
    TeamWorkload, Workload,
};

use chrono::NaiveDate;
use indexmap::IndexMap;

/// Monthly series keyed by `YYYY-MM`, oldest month first.
pub type MonthlySeries<T> = IndexMap<String, MonthlyRollup<T>>;

/// Main entry point: binds a data source to a reference date and lookback window.
pub struct LinearLens<S: DataSource> {
    source: S,
    now: NaiveDate,
    lookback_months: u32,
}

impl<S: DataSource> LinearLens<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            now: chrono::Local::now().date_naive(),
            lookback_months: PeriodFilter::DEFAULT_LOOKBACK_MONTHS,
        }
    }

    /// Anchor every period computation at `now` instead of today.
    pub fn with_now(mut self, now: NaiveDate) -> Self {
        self.now = now;
        self
    }

    pub fn with_lookback(mut self, months: u32) -> Self {
        self.lookback_months = months;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn period_filter(&self) -> PeriodFilter {
        PeriodFilter::new(self.now).with_lookback(self.lookback_months)
    }

    pub fn monthly_processor(&self) -> MonthlyProcessor {
        MonthlyProcessor::new(self.now).with_months_back(self.lookback_months)
    }

    /// Summary report over the issues in `period`. Unknown period names keep every issue.
    pub fn report(&self, period: &str) -> Result<Report> {
        let snapshot = self.source.snapshot()?;
        let issues: Vec<Issue> = self
            .period_filter()
            .filter(&snapshot.issues, period)
            .into_iter()
            .cloned()
            .collect();
        log::info!(
            "Report for period '{period}': {} of {} issues",
            issues.len(),
            snapshot.issues.len()
        );
        Ok(generate_report(&snapshot.teams, &snapshot.projects, &issues))
    }

    /// Single-team workload over the issues in `period`.
    pub fn team_workload(&self, team: &str, period: &str) -> Result<TeamWorkload> {
        let snapshot = self.source.snapshot()?;
        let team = find_team(&snapshot.teams, team)?;
        let issues = self.period_filter().filter(&snapshot.issues, period);
        Ok(team_project_workload(issues, team, &snapshot.projects))
    }

    /// Multi-team completed-work rollup over the issues in `period`.
    pub fn engineer_workload(&self, period: &str) -> Result<Workload> {
        let snapshot = self.source.snapshot()?;
        let issues = self.period_filter().filter(&snapshot.issues, period);
        Ok(engineer_project_workload(
            issues,
            &snapshot.teams,
            &snapshot.projects,
        ))
    }

    /// Single-team workload per month over the lookback window.
    pub fn monthly_team_workload(&self, team: &str) -> Result<MonthlySeries<TeamWorkload>> {
        let snapshot = self.source.snapshot()?;
        let team = find_team(&snapshot.teams, team)?;
        Ok(self
            .monthly_processor()
            .process_monthly_team_data(&snapshot.issues, team, &snapshot.projects))
    }

    /// Multi-team completed-work rollup per month over the lookback window.
    pub fn monthly_workload(&self) -> Result<MonthlySeries<Workload>> {
        let snapshot = self.source.snapshot()?;
        Ok(self.monthly_processor().process_monthly_data(
            &snapshot.issues,
            &snapshot.teams,
            &snapshot.projects,
        ))
    }
}

/// Look a team up by id, key or name (key and name case-insensitive).
pub fn find_team<'a>(teams: &'a [Team], query: &str) -> Result<&'a Team> {
    let query = query.trim();
    teams
        .iter()
        .find(|t| t.id == query)
        .or_else(|| teams.iter().find(|t| t.key.eq_ignore_ascii_case(query)))
        .or_else(|| {
            teams
                .iter()
                .find(|t| t.name.to_lowercase() == query.to_lowercase())
        })
        .ok_or_else(|| {
            let known: Vec<String> = teams
                .iter()
                .map(|t| format!("{} ({})", t.name, t.key))
                .collect();
            Error::NotFound(format!(
                "team '{query}'. Known teams: {}",
                if known.is_empty() {
                    "none".to_string()
                } else {
                    known.join(", ")
                }
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Connection, Label, WorkflowState};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixture() -> Snapshot {
        let teams = vec![
            Team {
                id: "t1".to_string(),
                name: "Core".to_string(),
                key: "CORE".to_string(),
            },
            Team {
                id: "t2".to_string(),
                name: "Web".to_string(),
                key: "WEB".to_string(),
            },
        ];
        let projects = vec![Project {
            id: "p1".to_string(),
            name: "Auth".to_string(),
            state: Some("started".to_string()),
            labels: vec![Label {
                name: "capex".to_string(),
            }]
            .into(),
            teams: vec![EntityRef::new("t1", "Core")].into(),
        }];
        let issue = |id: &str, team: &str, completed: Option<&str>, created: &str, estimate: u32| Issue {
            id: id.to_string(),
            title: format!("Issue {id}"),
            estimate: Some(estimate),
            assignee: Some(EntityRef::new("u1", "Ann")),
            team: Some(EntityRef::new(team, team)),
            project: (team == "t1").then(|| EntityRef::new("p1", "Auth")),
            completed_at: completed.map(String::from),
            created_at: Some(created.to_string()),
            state: Some(WorkflowState {
                name: if completed.is_some() { "Done" } else { "Todo" }.to_string(),
            }),
            labels: Connection::default(),
        };
        let issues = vec![
            issue("a", "t1", Some("2023-06-10"), "2023-06-01", 5),
            issue("b", "t1", None, "2023-05-01", 3),
            issue("c", "t2", Some("2023-03-01"), "2023-02-01", 2),
            issue("old", "t2", Some("2021-01-01"), "2020-12-01", 8),
        ];
        Snapshot {
            teams,
            projects,
            issues,
        }
    }

    fn lens() -> LinearLens<MockSource> {
        LinearLens::new(MockSource::new(fixture())).with_now(ymd(2023, 6, 15))
    }

    #[test]
    fn test_find_team() {
        let teams = fixture().teams;
        assert_eq!(find_team(&teams, "t2").unwrap().name, "Web");
        assert_eq!(find_team(&teams, "core").unwrap().id, "t1");
        assert_eq!(find_team(&teams, "WEB").unwrap().id, "t2");
        let err = find_team(&teams, "mobile").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(err.to_string().contains("Core (CORE)"));
    }

    #[test]
    fn test_report_applies_period() {
        let report = lens().report("all").unwrap();
        assert_eq!(report.summary.issues_count, 3);
        assert_eq!(report.summary.teams_count, 2);
        assert_eq!(report.summary.issues_by_status["Done"], 2);
        assert_eq!(report.summary.capitalization_metrics.capitalized_issues, 2);

        let everything = lens().report("forever").unwrap();
        assert_eq!(everything.summary.issues_count, 4);
    }

    #[test]
    fn test_team_workload() {
        let tw = lens().team_workload("CORE", "month").unwrap();
        // Only "a" falls in June 2023; "b" was created in May.
        assert_eq!(tw.total_points, 5);
        assert!(matches!(lens().team_workload("nope", "all"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_engineer_workload() {
        let wl = lens().engineer_workload("all").unwrap();
        assert_eq!(wl["t1"].total_points, 5);
        assert_eq!(wl["t2"].total_points, 2);
    }

    #[test]
    fn test_monthly_views() {
        let series = lens().monthly_workload().unwrap();
        assert_eq!(series.len(), 6);
        assert_eq!(series["2023-06"].rollup["t1"].total_points, 5);
        assert_eq!(series["2023-03"].rollup["t2"].total_points, 2);

        let team_series = lens().with_lookback(3).monthly_team_workload("Core").unwrap();
        assert_eq!(team_series.len(), 3);
        assert_eq!(team_series["2023-05"].rollup.total_points, 3);
    }

    #[test]
    fn test_source_errors_propagate() {
        let lens = LinearLens::new(MockSource::failing("offline"));
        assert!(matches!(lens.report("all"), Err(Error::Source(_))));
        assert!(matches!(lens.engineer_workload("all"), Err(Error::Source(_))));
    }
}
