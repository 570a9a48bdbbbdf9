use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use linearlens::report::{CapitalizationMetrics, Report};
use linearlens::workload::{shares_by_points, TeamWorkload, Workload};
use linearlens::{Config, LinearLens, MonthlySeries, Period, SnapshotSource};

#[derive(Parser)]
#[command(name = "linearlens", about = "Workload and capitalization analytics for Linear")]
struct Cli {
    /// Snapshot JSON exported from Linear (overrides config and LINEARLENS_SNAPSHOT)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Config file (default: ~/.linearlens/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fail on malformed records instead of skipping them
    #[arg(long, global = true)]
    strict: bool,

    /// Increase logging verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summary report: status and team histograms, completion and capitalization
    Report {
        #[arg(long, value_enum, default_value = "table")]
        format: Format,
        #[arg(long, value_enum, default_value = "all")]
        period: PeriodArg,
    },
    /// Workload of one team by project and contributor
    TeamWorkload {
        /// Team id, key or name
        team: String,
        #[arg(long, value_enum, default_value = "table")]
        format: Format,
        /// Summary view only (default: all)
        #[arg(long, value_enum)]
        period: Option<PeriodArg>,
        #[arg(long, value_enum, default_value = "summary")]
        view: View,
    },
    /// Completed work per team, project and contributor
    EngineerWorkload {
        #[arg(long, value_enum, default_value = "table")]
        format: Format,
        /// Summary view only (default: all)
        #[arg(long, value_enum)]
        period: Option<PeriodArg>,
        #[arg(long, value_enum, default_value = "summary")]
        view: View,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PeriodArg {
    All,
    Month,
    Quarter,
    Year,
}

impl From<PeriodArg> for Period {
    fn from(p: PeriodArg) -> Self {
        match p {
            PeriodArg::All => Period::All,
            PeriodArg::Month => Period::Month,
            PeriodArg::Quarter => Period::Quarter,
            PeriodArg::Year => Period::Year,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum View {
    /// One rollup over the selected period
    Summary,
    /// One rollup per month over the lookback window; `--period` is rejected
    Monthly,
}

/// The period a summary view covers. Monthly views always span the lookback
/// window, so an explicit `--period` there is an error.
fn summary_period(period: Option<PeriodArg>, view: View) -> anyhow::Result<Option<Period>> {
    match (view, period) {
        (View::Monthly, Some(_)) => anyhow::bail!(
            "--period cannot be combined with --view monthly, which always covers the lookback window"
        ),
        (View::Monthly, None) => Ok(None),
        (View::Summary, period) => Ok(Some(period.unwrap_or(PeriodArg::All).into())),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?.with_snapshot_override(
            std::env::var_os(linearlens::config::SNAPSHOT_ENV).map(PathBuf::from),
        ),
        None => Config::load()?,
    }
    .with_snapshot_override(cli.snapshot.clone());
    if cli.strict {
        config.safe_mode = false;
    }
    config.validate()?;

    let source = SnapshotSource::open(config.snapshot_path()?, config.fetch_config())?;
    let lens = LinearLens::new(source).with_lookback(config.lookback_months);

    match cli.command {
        Commands::Report { format, period } => {
            let period = Period::from(period);
            let report = lens.report(period.as_str())?;
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                Format::Table => print_report(&report, period),
            }
        }
        Commands::TeamWorkload {
            team,
            format,
            period,
            view,
        } => match summary_period(period, view)? {
            Some(period) => {
                let tw = lens.team_workload(&team, period.as_str())?;
                match format {
                    Format::Json => println!("{}", serde_json::to_string_pretty(&tw)?),
                    Format::Table => {
                        println!("Team Workload: {} ({period})", tw.name);
                        print_team_workload(&tw);
                    }
                }
            }
            None => {
                let series = lens.monthly_team_workload(&team)?;
                match format {
                    Format::Json => println!("{}", serde_json::to_string_pretty(&series)?),
                    Format::Table => print_monthly_team(&series),
                }
            }
        },
        Commands::EngineerWorkload {
            format,
            period,
            view,
        } => match summary_period(period, view)? {
            Some(period) => {
                let wl = lens.engineer_workload(period.as_str())?;
                match format {
                    Format::Json => println!("{}", serde_json::to_string_pretty(&wl)?),
                    Format::Table => {
                        println!("Engineer Workload ({period}, completed work)");
                        print_workload(&wl);
                    }
                }
            }
            None => {
                let series = lens.monthly_workload()?;
                match format {
                    Format::Json => println!("{}", serde_json::to_string_pretty(&series)?),
                    Format::Table => print_monthly(&series),
                }
            }
        },
    }

    Ok(())
}

fn print_report(report: &Report, period: Period) {
    let s = &report.summary;
    println!("Linear Report ({period})");
    println!("  Teams:    {}", s.teams_count);
    println!("  Projects: {}", s.projects_count);
    println!("  Issues:   {}", s.issues_count);

    println!("  Issues by status:");
    for (status, count) in sorted_counts(&s.issues_by_status) {
        println!("    {status:<24} {count}");
    }
    println!("  Issues by team:");
    for (team, count) in sorted_counts(&s.issues_by_team) {
        println!("    {team:<24} {count}");
    }
    println!("  Completion:");
    for (team, rate) in &s.team_completion_rates {
        println!(
            "    {team:<24} {}/{} ({:.1}%)",
            rate.completed, rate.total, rate.rate
        );
    }
    print_capitalization(&s.capitalization_metrics);
}

fn print_capitalization(c: &CapitalizationMetrics) {
    println!("  Capitalization:");
    println!(
        "    Overall:  {}/{} ({:.1}%)",
        c.capitalized_issues, c.total_issues, c.capitalization_rate
    );
    for (team, t) in &c.by_team {
        println!(
            "    {team:<24} {}/{} ({:.1}%)",
            t.capitalized, t.total, t.capitalization_rate
        );
    }
    if c.capitalized_projects.is_empty() {
        println!("    No capitalized projects");
    } else {
        println!("    Projects: {}", c.capitalized_projects.join(", "));
    }
}

fn sorted_counts(counts: &indexmap::IndexMap<String, u64>) -> Vec<(&String, &u64)> {
    let mut rows: Vec<_> = counts.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1));
    rows
}

fn print_team_workload(tw: &TeamWorkload) {
    if tw.is_empty() {
        println!("  No issues");
        return;
    }
    println!("  Total: {} points across {} issues", tw.total_points, tw.issue_count);
    println!("  By project:");
    for (_, project) in tw.projects_by_points() {
        println!("    {} ({} points)", project.name, project.total_points);
        for (_, share) in shares_by_points(&project.contributors) {
            println!(
                "      {:<22} {:>5} pts {:>6.2}%",
                share.name, share.points, share.percentage
            );
        }
    }
    println!("  By contributor:");
    for (_, contributor) in tw.contributors_by_points() {
        println!("    {} ({} points)", contributor.name, contributor.total_points);
        for (_, share) in shares_by_points(&contributor.projects) {
            println!(
                "      {:<22} {:>5} pts {:>6.2}%",
                share.name, share.points, share.percentage
            );
        }
    }
}

fn print_workload(wl: &Workload) {
    if wl.is_empty() {
        println!("  No teams");
        return;
    }
    for tw in wl.values() {
        println!("Team: {}", tw.name);
        print_team_workload(tw);
    }
}

fn print_monthly_team(series: &MonthlySeries<TeamWorkload>) {
    for (key, month) in series {
        println!("{} [{key}]: {} issues", month.month_name, month.issue_count);
        print_team_workload(&month.rollup);
    }
}

fn print_monthly(series: &MonthlySeries<Workload>) {
    for (key, month) in series {
        println!("{} [{key}]: {} issues", month.month_name, month.issue_count);
        print_workload(&month.rollup);
    }
}
