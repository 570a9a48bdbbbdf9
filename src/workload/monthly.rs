use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use serde::Serialize;

use crate::date_util::{month_key, month_label, shift_month};
use crate::model::{Issue, Project, Team};
use crate::query::period::{reference_date, ReferenceDate};

use super::{engineer_project_workload, team_project_workload, TeamWorkload, Workload};

/// Where issues with an unparseable reference date end up when bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidDatePolicy {
    /// Assign them to the current month (historical monthly-report behaviour).
    #[default]
    CurrentMonth,
    /// Drop them, matching the period filter.
    Exclude,
}

/// The issues whose reference date falls in one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthBucket<'a> {
    /// `YYYY-MM`
    pub key: String,
    /// `June 2023`
    pub label: String,
    pub year: i32,
    pub month: u32,
    pub issues: Vec<&'a Issue>,
}

/// A per-month rollup annotated with the month's label and issue count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRollup<T> {
    pub month_name: String,
    pub issue_count: usize,
    #[serde(flatten)]
    pub rollup: T,
}

/// Splits issues into a rolling window of calendar months and rolls up each month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyProcessor {
    now: NaiveDate,
    months_back: u32,
    invalid_dates: InvalidDatePolicy,
}

impl MonthlyProcessor {
    pub const DEFAULT_MONTHS_BACK: u32 = 6;

    pub fn new(now: NaiveDate) -> Self {
        Self {
            now,
            months_back: Self::DEFAULT_MONTHS_BACK,
            invalid_dates: InvalidDatePolicy::default(),
        }
    }

    pub fn today() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }

    pub fn with_months_back(mut self, months_back: u32) -> Self {
        self.months_back = months_back;
        self
    }

    pub fn with_invalid_dates(mut self, policy: InvalidDatePolicy) -> Self {
        self.invalid_dates = policy;
        self
    }

    /// Month keys of the window, oldest first, ending with the current month.
    pub fn window(&self) -> Vec<(i32, u32)> {
        (0..self.months_back)
            .rev()
            .map(|back| shift_month(self.now.year(), self.now.month(), back))
            .collect()
    }

    /// Partition issues into exactly `months_back` buckets, oldest first.
    ///
    /// Empty months are kept. Issues dated outside the window, or with no
    /// completion or creation date, are left out.
    pub fn group_by_month<'a, I>(&self, issues: I) -> IndexMap<String, MonthBucket<'a>>
    where
        I: IntoIterator<Item = &'a Issue>,
    {
        let mut buckets: IndexMap<String, MonthBucket<'a>> = self
            .window()
            .into_iter()
            .map(|(year, month)| {
                let key = month_key(year, month);
                let bucket = MonthBucket {
                    key: key.clone(),
                    label: month_label(year, month),
                    year,
                    month,
                    issues: Vec::new(),
                };
                (key, bucket)
            })
            .collect();
        let current_key = month_key(self.now.year(), self.now.month());

        for issue in issues {
            let key = match reference_date(issue) {
                ReferenceDate::Date(d) => month_key(d.year(), d.month()),
                ReferenceDate::Invalid(raw) => match self.invalid_dates {
                    InvalidDatePolicy::CurrentMonth => {
                        log::warn!(
                            "Issue {}: unparseable date '{raw}', counting it in {current_key}",
                            issue.id
                        );
                        current_key.clone()
                    }
                    InvalidDatePolicy::Exclude => {
                        log::warn!("Skipping issue {}: unparseable date '{raw}'", issue.id);
                        continue;
                    }
                },
                ReferenceDate::Missing => continue,
            };

            match buckets.get_mut(&key) {
                Some(bucket) => bucket.issues.push(issue),
                None => log::trace!("Issue {} in {key} is outside the monthly window", issue.id),
            }
        }

        buckets
    }

    /// Multi-team completed-work rollup for every month in the window.
    pub fn process_monthly_data<'a, I>(
        &self,
        issues: I,
        teams: &[Team],
        projects: &[Project],
    ) -> IndexMap<String, MonthlyRollup<Workload>>
    where
        I: IntoIterator<Item = &'a Issue>,
    {
        self.group_by_month(issues)
            .into_iter()
            .map(|(key, bucket)| {
                let rollup = engineer_project_workload(bucket.issues.iter().copied(), teams, projects);
                let monthly = MonthlyRollup {
                    month_name: bucket.label,
                    issue_count: bucket.issues.len(),
                    rollup,
                };
                (key, monthly)
            })
            .collect()
    }

    /// Single-team rollup for every month in the window.
    pub fn process_monthly_team_data<'a, I>(
        &self,
        issues: I,
        team: &Team,
        projects: &[Project],
    ) -> IndexMap<String, MonthlyRollup<TeamWorkload>>
    where
        I: IntoIterator<Item = &'a Issue>,
    {
        self.group_by_month(issues)
            .into_iter()
            .map(|(key, bucket)| {
                let rollup = team_project_workload(bucket.issues.iter().copied(), team, projects);
                let monthly = MonthlyRollup {
                    month_name: bucket.label,
                    issue_count: bucket.issues.len(),
                    rollup,
                };
                (key, monthly)
            })
            .collect()
    }
}
