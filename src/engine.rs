use chrono::Datelike;
use serde::Serialize;
use uuid::Uuid;

use crate::advisor::{self, Badge, NextStep};
use crate::aggregate::{aggregate, aggregate_cohort, read_ledger};
use crate::category::Category;
use crate::config::ScoringConfig;
use crate::ledger::{ActivityLedger, LedgerError};
use crate::models::{ActivityTrends, Cohort, DateRange, RankedEntry};
use crate::ranking::{self, MetricLeaderboard, ScopeAverages, ScopedRanks};
use crate::scoring::{self, Evaluation};
use crate::similarity::{self, SimilarResearcher};
use crate::trends;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonFilters {
    pub range: Option<DateRange>,
    /// Year pinned by the trend view's monthly buckets.
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub researcher: RankedEntry,
    pub range: Option<DateRange>,
    pub ranks: ScopedRanks,
    pub averages: ScopeAverages,
    pub leaderboards: Vec<MetricLeaderboard>,
    pub badges: Vec<Badge>,
    pub similar: Vec<SimilarResearcher>,
    pub trends: ActivityTrends,
    pub next_step: NextStep,
}

/// Read-then-compute pipeline over an activity ledger. Every query reloads
/// what it needs; nothing is cached between calls.
pub struct ScoringEngine<L> {
    ledger: L,
    config: ScoringConfig,
}

impl<L: ActivityLedger> ScoringEngine<L> {
    pub fn new(ledger: L, config: ScoringConfig) -> Self {
        Self { ledger, config }
    }

    /// Loads every active researcher and their full ledger, then scores each
    /// one on the records inside `range`.
    pub async fn load_cohort(&self, range: Option<&DateRange>) -> Result<Cohort, LedgerError> {
        let researchers = self.ledger.list_active_researchers().await?;
        let ids: Vec<Uuid> = researchers.iter().map(|researcher| researcher.id).collect();
        let records = read_ledger(&self.ledger, &ids).await?;
        let mut counts = aggregate_cohort(&records, range);

        let entries: Vec<RankedEntry> = researchers
            .into_iter()
            .map(|researcher| {
                let counts = counts.remove(&researcher.id).unwrap_or_default();
                RankedEntry {
                    score: scoring::comparison_score(&counts, &self.config.comparison_weights),
                    points: scoring::weighted_points(&counts, &self.config.comparison_weights),
                    researcher,
                    counts,
                }
            })
            .collect();

        tracing::info!(
            researchers = entries.len(),
            records = records.len(),
            ranged = range.is_some(),
            "loaded cohort"
        );
        if entries.is_empty() {
            tracing::warn!("no active researchers; rankings will be empty");
        }

        Ok(Cohort { entries, records })
    }

    /// Bounded 0..=100 score with a per-category breakdown. Goals are looked up
    /// for the period's starting year.
    pub async fn evaluation_score(
        &self,
        researcher_id: Uuid,
        period: Option<DateRange>,
    ) -> Result<Evaluation, LedgerError> {
        let records = read_ledger(&self.ledger, &[researcher_id]).await?;
        let counts = aggregate(researcher_id, &records, period.as_ref());
        let goals = self
            .ledger
            .list_goals(researcher_id, period.map(|range| range.start.year()))
            .await?;

        let evaluation = scoring::evaluate(&counts, &self.config, &scoring::goal_table(&goals));
        tracing::debug!(%researcher_id, score = evaluation.score, "evaluated researcher");
        Ok(evaluation)
    }

    /// `None` when the researcher is not an active cohort member.
    pub async fn comparison_data(
        &self,
        researcher_id: Uuid,
        filters: ComparisonFilters,
    ) -> Result<Option<ComparisonReport>, LedgerError> {
        let cohort = self.load_cohort(filters.range.as_ref()).await?;
        Ok(self.compare_within(&cohort, researcher_id, filters))
    }

    /// Builds the comparison report from an already loaded cohort.
    pub fn compare_within(
        &self,
        cohort: &Cohort,
        researcher_id: Uuid,
        filters: ComparisonFilters,
    ) -> Option<ComparisonReport> {
        let Some(me) = cohort.find(researcher_id) else {
            tracing::warn!(%researcher_id, "researcher is not in the active cohort");
            return None;
        };
        let entries = &cohort.entries;

        let ranks = ranking::scoped_ranks(me, entries);
        let college = ranking::college_members(me, entries);
        let trends = trends::summarize(
            &cohort.records_for(researcher_id),
            &self.config.comparison_weights,
            filters.year,
        );

        Some(ComparisonReport {
            researcher: me.clone(),
            range: filters.range,
            averages: ranking::scope_averages(me, entries),
            leaderboards: ranking::leaderboards(researcher_id, entries),
            badges: advisor::badges(me, &ranks),
            similar: similarity::find_similar(me, entries),
            next_step: advisor::next_step(me, &college, ranks.college.rank),
            trends,
            ranks,
        })
    }

    pub async fn metric_leaderboard(
        &self,
        metric: Category,
        researcher_id: Uuid,
        range: Option<DateRange>,
    ) -> Result<MetricLeaderboard, LedgerError> {
        let cohort = self.load_cohort(range.as_ref()).await?;
        Ok(ranking::metric_leaderboard(metric, researcher_id, &cohort.entries))
    }

    /// Trends cover the researcher's whole history regardless of any page
    /// date filter.
    pub async fn activity_trends(
        &self,
        researcher_id: Uuid,
        year: i32,
    ) -> Result<ActivityTrends, LedgerError> {
        let records = read_ledger(&self.ledger, &[researcher_id]).await?;
        Ok(trends::summarize(&records, &self.config.comparison_weights, year))
    }
}
