pub mod monthly;
pub mod types;

pub use monthly::{InvalidDatePolicy, MonthBucket, MonthlyProcessor, MonthlyRollup};
pub use types::*;

use std::collections::{HashMap, HashSet};

use crate::model::{Issue, Project, Team};

/// How the legacy multi-team rollup treats issues without a nonzero estimate.
///
/// The single-team rollup always floors missing estimates at 1 point. The
/// multi-team rollup historically dropped unestimated issues instead; the two
/// rules have never been reconciled, so the legacy one stays selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EstimatePolicy {
    /// Count a missing or zero estimate as 1 point.
    FloorAtOne,
    /// Leave issues without a nonzero estimate out of the rollup.
    #[default]
    SkipUnestimated,
}

impl EstimatePolicy {
    fn points(self, issue: &Issue) -> Option<u64> {
        match self {
            EstimatePolicy::FloorAtOne => Some(issue.points()),
            EstimatePolicy::SkipUnestimated => issue.nonzero_estimate().map(u64::from),
        }
    }
}

/// Project id → ids of the teams the project belongs to.
#[derive(Debug, Default)]
pub struct ProjectTeams<'a> {
    teams_by_project: HashMap<&'a str, HashSet<&'a str>>,
}

impl<'a> ProjectTeams<'a> {
    pub fn new(projects: &'a [Project]) -> Self {
        let mut teams_by_project: HashMap<&str, HashSet<&str>> = HashMap::new();
        for project in projects {
            teams_by_project
                .entry(project.id.as_str())
                .or_default()
                .extend(project.team_ids());
        }
        Self { teams_by_project }
    }

    /// Membership set for a project; `None` if the project is unknown.
    pub fn teams_of(&self, project_id: &str) -> Option<&HashSet<&'a str>> {
        self.teams_by_project.get(project_id)
    }

    pub fn contains(&self, project_id: &str, team_id: &str) -> bool {
        self.teams_of(project_id)
            .is_some_and(|teams| teams.contains(team_id))
    }

    /// True when the issue belongs to `team_id` directly (its own team) or
    /// through its project's team membership.
    pub fn issue_in_team(&self, issue: &Issue, team_id: &str) -> bool {
        issue.team_id() == Some(team_id)
            || issue
                .project_id()
                .is_some_and(|pid| self.contains(pid, team_id))
    }

    /// True when the issue's project declares team membership that does not
    /// include the issue's own team.
    fn conflicts_with_team(&self, issue: &Issue, team_id: &str) -> bool {
        issue
            .project_id()
            .and_then(|pid| self.teams_of(pid))
            .is_some_and(|teams| !teams.is_empty() && !teams.contains(team_id))
    }
}

/// Rollup of one team's work across projects and contributors.
///
/// Every issue attributed to the team, directly or through a project the team
/// belongs to, counts; a missing or zero estimate counts as 1 point.
pub fn team_project_workload<'a, I>(issues: I, team: &Team, projects: &[Project]) -> TeamWorkload
where
    I: IntoIterator<Item = &'a Issue>,
{
    let membership = ProjectTeams::new(projects);
    let mut workload = TeamWorkload::new(team.name.clone());

    for issue in issues {
        if !membership.issue_in_team(issue, &team.id) {
            continue;
        }
        workload.add(issue.project.as_ref(), issue.assignee.as_ref(), issue.points());
    }

    workload.finalize();
    log::debug!(
        "Team {} workload: {} issues, {} points",
        team.name,
        workload.issue_count,
        workload.total_points
    );
    workload
}

/// Legacy multi-team rollup of completed work, keyed by team id.
///
/// Uses [`EstimatePolicy::SkipUnestimated`]; see
/// [`engineer_project_workload_with`] for the explicit form.
/// Skipping versus flooring unestimated work here is pending product review.
pub fn engineer_project_workload<'a, I>(issues: I, teams: &[Team], projects: &[Project]) -> Workload
where
    I: IntoIterator<Item = &'a Issue>,
{
    engineer_project_workload_with(issues, teams, projects, EstimatePolicy::default())
}

/// Multi-team rollup of completed work.
///
/// Issues without a team or a completion timestamp are skipped, as are issues
/// whose project lists member teams that exclude the issue's own team. Every
/// team in `teams` appears in the result, even with no work; issues from teams
/// not in the list are rolled up under their own team reference.
pub fn engineer_project_workload_with<'a, I>(
    issues: I,
    teams: &[Team],
    projects: &[Project],
    policy: EstimatePolicy,
) -> Workload
where
    I: IntoIterator<Item = &'a Issue>,
{
    let membership = ProjectTeams::new(projects);
    let mut workload: Workload = teams
        .iter()
        .map(|t| (t.id.clone(), TeamWorkload::new(t.name.clone())))
        .collect();

    let mut skipped = 0usize;
    for issue in issues {
        let Some(team) = issue.team.as_ref() else {
            skipped += 1;
            continue;
        };
        if !issue.is_completed() || membership.conflicts_with_team(issue, &team.id) {
            skipped += 1;
            continue;
        }
        let Some(points) = policy.points(issue) else {
            skipped += 1;
            continue;
        };

        workload
            .entry(team.id.clone())
            .or_insert_with(|| TeamWorkload::new(team.name.clone()))
            .add(issue.project.as_ref(), issue.assignee.as_ref(), points);
    }

    for team_workload in workload.values_mut() {
        team_workload.finalize();
    }
    log::debug!(
        "Engineer workload: {} teams, {skipped} issues skipped",
        workload.len()
    );
    workload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Connection, EntityRef};

    fn team(id: &str, name: &str) -> Team {
        Team {
            id: id.to_string(),
            name: name.to_string(),
            key: name.to_uppercase(),
        }
    }

    fn project(id: &str, name: &str, team_ids: &[&str]) -> Project {
        Project {
            id: id.to_string(),
            name: name.to_string(),
            state: None,
            labels: Connection::default(),
            teams: team_ids
                .iter()
                .map(|t| EntityRef::new(*t, format!("Team {t}")))
                .collect::<Vec<_>>()
                .into(),
        }
    }

    struct IssueFixture<'s> {
        id: &'s str,
        team: Option<&'s str>,
        project: Option<&'s str>,
        assignee: Option<(&'s str, &'s str)>,
        estimate: Option<u32>,
        completed: bool,
    }

    impl Default for IssueFixture<'_> {
        fn default() -> Self {
            Self {
                id: "i",
                team: Some("t1"),
                project: Some("p1"),
                assignee: Some(("u1", "Ann")),
                estimate: Some(1),
                completed: true,
            }
        }
    }

    fn issue(fx: IssueFixture<'_>) -> Issue {
        Issue {
            id: fx.id.to_string(),
            title: format!("Issue {}", fx.id),
            estimate: fx.estimate,
            assignee: fx.assignee.map(|(id, name)| EntityRef::new(id, name)),
            team: fx.team.map(|t| EntityRef::new(t, format!("Team {t}"))),
            project: fx.project.map(|p| EntityRef::new(p, format!("Project {p}"))),
            completed_at: fx.completed.then(|| "2023-06-01T00:00:00Z".to_string()),
            created_at: Some("2023-05-01T00:00:00Z".to_string()),
            state: None,
            labels: Connection::default(),
        }
    }

    fn assert_percentages_sum_to_100(tw: &TeamWorkload) {
        for proj in tw.projects.values() {
            if proj.total_points == 0 {
                continue;
            }
            let sum: f64 = proj.contributors.values().map(|s| s.percentage).sum();
            let tolerance = proj.contributors.len() as f64 * 0.005 + 1e-9;
            assert!(
                (sum - 100.0).abs() <= tolerance,
                "project {} contributor percentages sum to {sum}",
                proj.name
            );
        }
        for contrib in tw.contributors.values() {
            if contrib.total_points == 0 {
                continue;
            }
            let sum: f64 = contrib.projects.values().map(|s| s.percentage).sum();
            let tolerance = contrib.projects.len() as f64 * 0.005 + 1e-9;
            assert!(
                (sum - 100.0).abs() <= tolerance,
                "contributor {} project percentages sum to {sum}",
                contrib.name
            );
        }
    }

    #[test]
    fn test_single_contributor_gets_full_share() {
        let t1 = team("t1", "Core");
        let projects = vec![project("p1", "Auth", &["t1"])];
        let issues = vec![
            issue(IssueFixture { id: "a", estimate: Some(5), ..Default::default() }),
            issue(IssueFixture { id: "b", estimate: Some(3), ..Default::default() }),
        ];

        let tw = team_project_workload(&issues, &t1, &projects);

        assert_eq!(tw.contributors["u1"].total_points, 8);
        assert_eq!(tw.contributors["u1"].name, "Ann");
        assert_eq!(tw.projects["p1"].total_points, 8);
        assert_eq!(tw.projects["p1"].contributors["u1"].percentage, 100.0);
        assert_eq!(tw.contributors["u1"].projects["p1"].percentage, 100.0);
    }

    #[test]
    fn test_unestimated_unassigned_no_project_floors_to_one_point() {
        let t1 = team("t1", "Core");
        let issues = vec![issue(IssueFixture {
            project: None,
            assignee: None,
            estimate: Some(0),
            completed: false,
            ..Default::default()
        })];

        let tw = team_project_workload(&issues, &t1, &[]);

        let unassigned = &tw.contributors[UNASSIGNED];
        assert_eq!(unassigned.total_points, 1);
        assert_eq!(unassigned.name, UNASSIGNED_NAME);
        assert_eq!(unassigned.projects[NO_PROJECT].points, 1);
        assert_eq!(tw.projects[NO_PROJECT].contributors[UNASSIGNED].points, 1);
        assert_eq!(tw.projects[NO_PROJECT].contributors[UNASSIGNED].percentage, 100.0);
    }

    #[test]
    fn test_indirect_membership_through_project() {
        let t1 = team("t1", "Core");
        let projects = vec![
            project("shared", "Shared", &["t1", "t2"]),
            project("other", "Other", &["t2"]),
        ];
        let issues = vec![
            issue(IssueFixture { id: "via-project", team: Some("t2"), project: Some("shared"), ..Default::default() }),
            issue(IssueFixture { id: "foreign", team: Some("t2"), project: Some("other"), ..Default::default() }),
            issue(IssueFixture { id: "no-team", team: None, project: None, ..Default::default() }),
            issue(IssueFixture { id: "direct", team: Some("t1"), project: Some("other"), ..Default::default() }),
        ];

        let tw = team_project_workload(&issues, &t1, &projects);

        assert_eq!(tw.issue_count, 2);
        assert!(tw.projects.contains_key("shared"));
        assert!(tw.projects.contains_key("other"));
        assert_eq!(tw.projects["other"].issue_count, 1);
    }

    #[test]
    fn test_percentages_sum_to_100() {
        let t1 = team("t1", "Core");
        let projects = vec![project("p1", "Auth", &["t1"]), project("p2", "Billing", &["t1"])];
        let people = [("u1", "Ann"), ("u2", "Bob"), ("u3", "Cy")];
        let mut issues = Vec::new();
        for n in 0..30u32 {
            issues.push(issue(IssueFixture {
                id: "x",
                project: Some(if n % 3 == 0 { "p2" } else { "p1" }),
                assignee: if n % 7 == 0 { None } else { Some(people[(n % 3) as usize]) },
                estimate: Some(n % 5),
                ..Default::default()
            }));
        }

        let tw = team_project_workload(&issues, &t1, &projects);
        assert_percentages_sum_to_100(&tw);

        let multi = engineer_project_workload_with(&issues, &[t1], &projects, EstimatePolicy::FloorAtOne);
        assert_percentages_sum_to_100(&multi["t1"]);
    }

    #[test]
    fn test_engineer_workload_skips_incomplete_teamless_and_unestimated() {
        let teams = vec![team("t1", "Core"), team("t2", "Web")];
        let projects = vec![project("p1", "Auth", &["t1"])];
        let issues = vec![
            issue(IssueFixture { id: "done", estimate: Some(2), ..Default::default() }),
            issue(IssueFixture { id: "open", estimate: Some(2), completed: false, ..Default::default() }),
            issue(IssueFixture { id: "no-team", team: None, ..Default::default() }),
            issue(IssueFixture { id: "unestimated", estimate: None, ..Default::default() }),
            issue(IssueFixture { id: "zero", estimate: Some(0), ..Default::default() }),
        ];

        let wl = engineer_project_workload(&issues, &teams, &projects);

        assert_eq!(wl.len(), 2);
        assert_eq!(wl["t1"].total_points, 2);
        assert_eq!(wl["t1"].issue_count, 1);
        assert!(wl["t2"].is_empty());
        assert_eq!(wl["t2"].name, "Web");
    }

    #[test]
    fn test_engineer_workload_floor_policy() {
        let teams = vec![team("t1", "Core")];
        let issues = vec![
            issue(IssueFixture { id: "unestimated", estimate: None, ..Default::default() }),
            issue(IssueFixture { id: "zero", estimate: Some(0), ..Default::default() }),
        ];
        let wl = engineer_project_workload_with(&issues, &teams, &[], EstimatePolicy::FloorAtOne);
        assert_eq!(wl["t1"].total_points, 2);
    }

    #[test]
    fn test_engineer_workload_project_team_sanity_filter() {
        let teams = vec![team("t1", "Core"), team("t2", "Web")];
        let projects = vec![
            project("p1", "Auth", &["t1"]),
            project("orphan", "Orphan", &[]),
        ];
        let issues = vec![
            // p1 belongs only to t1, so a t2 issue in p1 is dropped.
            issue(IssueFixture { id: "mismatch", team: Some("t2"), project: Some("p1"), ..Default::default() }),
            // Empty membership does not exclude.
            issue(IssueFixture { id: "orphan", team: Some("t2"), project: Some("orphan"), ..Default::default() }),
            // Unknown project does not exclude.
            issue(IssueFixture { id: "unknown", team: Some("t2"), project: Some("ghost"), ..Default::default() }),
        ];

        let wl = engineer_project_workload(&issues, &teams, &projects);

        assert_eq!(wl["t2"].issue_count, 2);
        assert!(!wl["t2"].projects.contains_key("p1"));
        assert!(wl["t1"].is_empty());
    }

    #[test]
    fn test_engineer_workload_includes_unlisted_teams() {
        let issues = vec![issue(IssueFixture { team: Some("t9"), project: None, ..Default::default() })];
        let wl = engineer_project_workload(&issues, &[], &[]);
        assert_eq!(wl["t9"].name, "Team t9");
        assert_eq!(wl["t9"].total_points, 1);
    }

    #[test]
    fn test_modes_agree_on_fully_qualifying_issues() {
        let t1 = team("t1", "Core");
        let projects = vec![project("p1", "Auth", &["t1"]), project("p2", "Billing", &["t1", "t2"])];
        let issues: Vec<Issue> = (1..=12u32)
            .map(|n| {
                issue(IssueFixture {
                    id: "q",
                    project: Some(if n % 2 == 0 { "p1" } else { "p2" }),
                    assignee: if n % 4 == 0 { None } else { Some(("u1", "Ann")) },
                    estimate: Some(n),
                    ..Default::default()
                })
            })
            .collect();

        let single = team_project_workload(&issues, &t1, &projects);
        let multi = engineer_project_workload(&issues, std::slice::from_ref(&t1), &projects);

        assert_eq!(single.total_points, multi["t1"].total_points);
        assert_eq!(single.total_points, (1..=12u64).sum::<u64>());
        for (pid, proj) in &single.projects {
            assert_eq!(proj.total_points, multi["t1"].projects[pid].total_points);
        }
    }

    #[test]
    fn test_empty_inputs() {
        let t1 = team("t1", "Core");
        let none: Vec<Issue> = Vec::new();
        let tw = team_project_workload(&none, &t1, &[]);
        assert!(tw.is_empty());
        assert_eq!(tw.name, "Core");

        let wl = engineer_project_workload(&none, &[], &[]);
        assert!(wl.is_empty());
    }
}
