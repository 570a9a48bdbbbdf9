use chrono::{Datelike, NaiveDate};

use crate::date_util::{months_before, parse_date, quarter_of};
use crate::error::{Error, Result};
use crate::model::Issue;

/// A reporting window relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// The rolling lookback window (last N calendar months, N = 6 by default).
    All,
    /// Same calendar month and year as now.
    Month,
    /// Same quarter and year as now.
    Quarter,
    /// Same year as now.
    Year,
}

impl Period {
    pub const NAMES: [&'static str; 4] = ["all", "month", "quarter", "year"];

    /// Look up a period by name (case-insensitive). Unknown names yield `None`.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Some(Period::All),
            "month" => Some(Period::Month),
            "quarter" => Some(Period::Quarter),
            "year" => Some(Period::Year),
            _ => None,
        }
    }

    /// Strict parse for boundaries that must reject unknown names.
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| {
            Error::PeriodParse(format!(
                "unrecognized period: {s} (expected one of: {})",
                Self::NAMES.join(", ")
            ))
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::All => "all",
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving an issue's reference date
/// (completion date if present, else creation date).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceDate {
    /// Neither timestamp is set.
    Missing,
    /// The chosen timestamp could not be parsed.
    Invalid(String),
    Date(NaiveDate),
}

pub fn reference_date(issue: &Issue) -> ReferenceDate {
    match issue.reference_timestamp() {
        None => ReferenceDate::Missing,
        Some(raw) => match parse_date(raw) {
            Some(d) => ReferenceDate::Date(d),
            None => ReferenceDate::Invalid(raw.to_string()),
        },
    }
}

/// Narrows issue collections to a reporting period anchored at a fixed "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodFilter {
    now: NaiveDate,
    lookback_months: u32,
}

impl PeriodFilter {
    pub const DEFAULT_LOOKBACK_MONTHS: u32 = 6;

    pub fn new(now: NaiveDate) -> Self {
        Self {
            now,
            lookback_months: Self::DEFAULT_LOOKBACK_MONTHS,
        }
    }

    /// A filter anchored at today's local date.
    pub fn today() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }

    pub fn with_lookback(mut self, months: u32) -> Self {
        self.lookback_months = months;
        self
    }

    pub fn now(&self) -> NaiveDate {
        self.now
    }

    pub fn lookback_months(&self) -> u32 {
        self.lookback_months
    }

    /// Earliest date (inclusive) retained by [`Period::All`].
    pub fn cutoff(&self) -> NaiveDate {
        months_before(self.now, self.lookback_months)
    }

    /// Returns true if `date` falls inside `period`.
    pub fn contains(&self, period: Period, date: NaiveDate) -> bool {
        let now = self.now;
        match period {
            Period::All => date >= self.cutoff(),
            Period::Month => date.year() == now.year() && date.month() == now.month(),
            Period::Quarter => date.year() == now.year() && quarter_of(date) == quarter_of(now),
            Period::Year => date.year() == now.year(),
        }
    }

    /// Filter by period name. Unrecognized names pass every issue through unfiltered.
    pub fn filter<'a, I>(&self, issues: I, period: &str) -> Vec<&'a Issue>
    where
        I: IntoIterator<Item = &'a Issue>,
    {
        match Period::from_name(period) {
            Some(p) => self.filter_period(issues, p),
            None => {
                log::debug!("Unrecognized period '{period}', returning issues unfiltered");
                issues.into_iter().collect()
            }
        }
    }

    /// Filter by a known period. Issues without a usable reference date are dropped.
    pub fn filter_period<'a, I>(&self, issues: I, period: Period) -> Vec<&'a Issue>
    where
        I: IntoIterator<Item = &'a Issue>,
    {
        issues
            .into_iter()
            .filter(|issue| match reference_date(issue) {
                ReferenceDate::Date(d) => self.contains(period, d),
                ReferenceDate::Invalid(raw) => {
                    log::warn!("Skipping issue {}: unparseable date '{raw}'", issue.id);
                    false
                }
                ReferenceDate::Missing => {
                    log::debug!("Skipping issue {}: no completion or creation date", issue.id);
                    false
                }
            })
            .collect()
    }
}
