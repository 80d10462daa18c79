use std::path::PathBuf;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

mod advisor;
mod aggregate;
mod category;
mod config;
mod db;
mod engine;
mod ledger;
mod models;
mod ranking;
mod report;
mod scoring;
mod similarity;
mod telemetry;
mod trends;

#[cfg(test)]
mod test_support;

use category::Category;
use config::AppConfig;
use db::PgLedger;
use engine::{ComparisonFilters, ScoringEngine};
use ledger::{ActivityLedger, MemoryLedger};
use models::DateRange;

#[derive(Parser)]
#[command(name = "researcher-scoring")]
#[command(about = "Evaluation scores, peer rankings and trends for university researchers", long_about = None)]
struct Cli {
    /// Read researchers and activities from CSV files in this directory instead of Postgres
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import activities from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    #[command(flatten)]
    Query(QueryCommand),
}

#[derive(Subcommand)]
enum QueryCommand {
    /// Bounded 0-100 evaluation score with a per-category breakdown
    Evaluate {
        #[arg(long)]
        researcher: Uuid,
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Ranks, leaderboards, badges, similar researchers and next step
    Compare {
        #[arg(long)]
        researcher: Uuid,
        #[command(flatten)]
        period: PeriodArgs,
        /// Year used for the monthly trend view (defaults to the current year)
        #[arg(long)]
        trend_year: Option<i32>,
    },
    /// Top 10 for a single metric plus the researcher's own rank
    Leaderboard {
        #[arg(long)]
        metric: Category,
        #[arg(long)]
        researcher: Uuid,
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Yearly and monthly activity points
    Trends {
        #[arg(long)]
        researcher: Uuid,
        #[arg(long)]
        year: Option<i32>,
    },
    /// Write a markdown comparison report
    Report {
        #[arg(long)]
        researcher: Uuid,
        #[command(flatten)]
        period: PeriodArgs,
        #[arg(long)]
        trend_year: Option<i32>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Args, Clone, Copy)]
struct PeriodArgs {
    /// First day counted (inclusive)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day counted (inclusive)
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Shorthand for a whole calendar year
    #[arg(long, conflicts_with_all = ["from", "to"])]
    year: Option<i32>,
}

impl PeriodArgs {
    fn range(self) -> anyhow::Result<Option<DateRange>> {
        if let Some(year) = self.year {
            return DateRange::calendar_year(year)
                .map(Some)
                .with_context(|| format!("year {year} is out of range"));
        }
        if self.from.is_none() && self.to.is_none() {
            return Ok(None);
        }
        let range = DateRange {
            start: self.from.unwrap_or(NaiveDate::MIN),
            end: self.to.unwrap_or(NaiveDate::MAX),
        };
        if range.start > range.end {
            anyhow::bail!("--from {} is after --to {}", range.start, range.end);
        }
        Ok(Some(range))
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set to a production Postgres instance (or pass --dataset)")?;

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.log_level)?;
    let scoring = config.scoring()?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&connect(&config).await?).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&connect(&config).await?).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&connect(&config).await?, &csv).await?;
            println!("Inserted {inserted} activities from {}.", csv.display());
        }
        Commands::Query(query) => match &cli.dataset {
            Some(dir) => {
                let ledger = MemoryLedger::from_dir(dir)
                    .with_context(|| format!("failed to load dataset from {}", dir.display()))?;
                run_query(&ScoringEngine::new(ledger, scoring), query, cli.json).await?;
            }
            None => {
                let ledger = PgLedger::new(connect(&config).await?);
                run_query(&ScoringEngine::new(ledger, scoring), query, cli.json).await?;
            }
        },
    }

    Ok(())
}

async fn run_query<L: ActivityLedger>(
    engine: &ScoringEngine<L>,
    query: QueryCommand,
    json: bool,
) -> anyhow::Result<()> {
    let current_year = Utc::now().year();

    match query {
        QueryCommand::Evaluate { researcher, period } => {
            let evaluation = engine.evaluation_score(researcher, period.range()?).await?;
            if json {
                return print_json(&evaluation);
            }
            println!("Evaluation score: {}/100", evaluation.score);
            for item in &evaluation.breakdown {
                let achievement = item
                    .achievement_percent
                    .map(|percent| format!(", {percent}% of goal"))
                    .unwrap_or_default();
                println!(
                    "- {}: {} of {} -> {:.2} of {:.0}{}",
                    item.category.label(),
                    item.count,
                    item.cap,
                    item.contribution,
                    item.weight,
                    achievement
                );
            }
        }
        QueryCommand::Compare {
            researcher,
            period,
            trend_year,
        } => {
            let filters = ComparisonFilters {
                range: period.range()?,
                year: trend_year.unwrap_or(current_year),
            };
            let Some(report) = engine.comparison_data(researcher, filters).await? else {
                println!("Researcher {researcher} is not an active cohort member.");
                return Ok(());
            };
            if json {
                return print_json(&report);
            }
            let ranks = &report.ranks;
            println!(
                "{}: {:.0} comparison points",
                report.researcher.researcher.name, report.researcher.score
            );
            println!(
                "Rank: university #{} of {}, college #{} of {}, department #{} of {}",
                ranks.university.rank,
                ranks.university.size,
                ranks.college.rank,
                ranks.college.size,
                ranks.department.rank,
                ranks.department.size
            );
            for badge in &report.badges {
                println!("Badge: {}", badge.label());
            }
            if report.similar.is_empty() {
                println!("Not enough data to find similar researchers.");
            }
            for peer in &report.similar {
                println!("Similar: {} (distance {:.0})", peer.name, peer.distance);
            }
            println!(
                "Next step: focus on {} for an estimated college rank gain of {}.",
                report.next_step.focus.label(),
                report.next_step.estimated_college_rank_gain
            );
        }
        QueryCommand::Leaderboard {
            metric,
            researcher,
            period,
        } => {
            let board = engine
                .metric_leaderboard(metric, researcher, period.range()?)
                .await?;
            if json {
                return print_json(&board);
            }
            println!("Top researchers for {}:", metric.label());
            for row in &board.top {
                println!("{:>3}. {} ({}) {:.0} pts", row.rank, row.name, row.college, row.points);
            }
            println!(
                "Your rank: #{} of {} with {:.0} pts",
                board.my_rank, board.cohort_size, board.my_points
            );
        }
        QueryCommand::Trends { researcher, year } => {
            let trends = engine
                .activity_trends(researcher, year.unwrap_or(current_year))
                .await?;
            if json {
                return print_json(&trends);
            }
            for bucket in &trends.yearly {
                println!("{}: {:.0} pts", bucket.year, bucket.points);
            }
            for bucket in &trends.monthly {
                println!("{}-{:02}: {:.0} pts", trends.year, bucket.month, bucket.points);
            }
            match trends.best_year {
                Some(best) => println!("Best year: {best}"),
                None => println!("No dated activity yet."),
            }
        }
        QueryCommand::Report {
            researcher,
            period,
            trend_year,
            out,
        } => {
            let range = period.range()?;
            let filters = ComparisonFilters {
                range,
                year: trend_year.unwrap_or(current_year),
            };
            let Some(comparison) = engine.comparison_data(researcher, filters).await? else {
                println!("Researcher {researcher} is not an active cohort member.");
                return Ok(());
            };
            let evaluation = engine.evaluation_score(researcher, range).await?;
            std::fs::write(&out, report::build_report(&comparison, &evaluation))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
