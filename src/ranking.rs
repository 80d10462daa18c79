use std::cmp::Ordering;

use serde::Serialize;
use uuid::Uuid;

use crate::category::Category;
use crate::models::RankedEntry;

pub const LEADERBOARD_SIZE: usize = 10;
pub const CHART_SIZE: usize = 5;

/// A descending sort key. Orderings compare keys left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankKey {
    Score,
    Metric(Category),
    ResearchCount,
    ActivityCount,
}

impl RankKey {
    fn value(self, entry: &RankedEntry) -> f64 {
        match self {
            RankKey::Score => entry.score,
            RankKey::Metric(category) => *entry.points.get(category),
            RankKey::ResearchCount => f64::from(entry.research_count()),
            RankKey::ActivityCount => f64::from(entry.activity_count()),
        }
    }
}

/// Overall ordering: score, then research count, then total activity.
pub const OVERALL_KEYS: [RankKey; 3] = [RankKey::Score, RankKey::ResearchCount, RankKey::ActivityCount];

pub fn metric_keys(metric: Category) -> [RankKey; 2] {
    [RankKey::Metric(metric), RankKey::Score]
}

fn compare(a: &RankedEntry, b: &RankedEntry, keys: &[RankKey]) -> Ordering {
    keys.iter()
        .map(|key| key.value(b).total_cmp(&key.value(a)))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Sorts descending by `keys`. The sort is stable, so entries equal on every
/// key keep their input order.
pub fn order_by<'a, I>(entries: I, keys: &[RankKey]) -> Vec<&'a RankedEntry>
where
    I: IntoIterator<Item = &'a RankedEntry>,
{
    let mut sorted: Vec<&RankedEntry> = entries.into_iter().collect();
    sorted.sort_by(|a, b| compare(a, b, keys));
    sorted
}

pub fn rank(cohort: &[RankedEntry]) -> Vec<&RankedEntry> {
    order_by(cohort, &OVERALL_KEYS)
}

/// 1-based position in an already sorted list. An absent researcher is placed
/// last (`sorted.len()`) instead of failing.
pub fn position_of(researcher_id: Uuid, sorted: &[&RankedEntry]) -> usize {
    sorted
        .iter()
        .position(|entry| entry.id() == researcher_id)
        .map(|index| index + 1)
        .unwrap_or(sorted.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScopeRank {
    pub rank: usize,
    pub size: usize,
    pub top_percent: u32,
}

impl ScopeRank {
    fn new(rank: usize, size: usize) -> Self {
        let top_percent = if size == 0 {
            0
        } else {
            (100.0 * rank as f64 / size as f64).ceil() as u32
        };
        Self { rank, size, top_percent }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScopedRanks {
    pub university: ScopeRank,
    pub college: ScopeRank,
    pub department: ScopeRank,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScopeAverages {
    pub university: f64,
    pub college: f64,
    pub department: f64,
}

fn same_college<'a>(me: &'a RankedEntry) -> impl Fn(&&RankedEntry) -> bool + 'a {
    move |entry| entry.researcher.college == me.researcher.college
}

fn same_department<'a>(me: &'a RankedEntry) -> impl Fn(&&RankedEntry) -> bool + 'a {
    move |entry| entry.researcher.department == me.researcher.department
}

pub fn college_members<'a>(me: &'a RankedEntry, cohort: &'a [RankedEntry]) -> Vec<&'a RankedEntry> {
    cohort.iter().filter(same_college(me)).collect()
}

/// Each scope is re-sorted on its own members rather than sliced from the
/// university ordering.
pub fn scoped_ranks(me: &RankedEntry, cohort: &[RankedEntry]) -> ScopedRanks {
    let scope = |members: Vec<&RankedEntry>| {
        let sorted = order_by(members, &OVERALL_KEYS);
        ScopeRank::new(position_of(me.id(), &sorted), sorted.len())
    };

    ScopedRanks {
        university: ScopeRank::new(position_of(me.id(), &rank(cohort)), cohort.len()),
        college: scope(college_members(me, cohort)),
        department: scope(cohort.iter().filter(same_department(me)).collect()),
    }
}

/// Rounded mean score; 0 for an empty subset.
pub fn scope_average<'a, I>(entries: I) -> f64
where
    I: IntoIterator<Item = &'a RankedEntry>,
{
    let (total, count) = entries
        .into_iter()
        .fold((0.0, 0usize), |(total, count), entry| (total + entry.score, count + 1));
    if count == 0 {
        0.0
    } else {
        (total / count as f64).round()
    }
}

pub fn scope_averages(me: &RankedEntry, cohort: &[RankedEntry]) -> ScopeAverages {
    ScopeAverages {
        university: scope_average(cohort),
        college: scope_average(cohort.iter().filter(same_college(me))),
        department: scope_average(cohort.iter().filter(same_department(me))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub researcher_id: Uuid,
    pub name: String,
    pub college: String,
    pub points: f64,
    pub score: f64,
}

impl LeaderboardRow {
    fn new(rank: usize, entry: &RankedEntry, metric: Category) -> Self {
        Self {
            rank,
            researcher_id: entry.id(),
            name: entry.researcher.name.clone(),
            college: entry.researcher.college.clone(),
            points: *entry.points.get(metric),
            score: entry.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricLeaderboard {
    pub metric: Category,
    pub top: Vec<LeaderboardRow>,
    pub my_rank: usize,
    pub my_points: f64,
    pub cohort_size: usize,
    /// Top `CHART_SIZE`, plus the requester when they rank below it.
    pub chart: Vec<LeaderboardRow>,
}

pub fn metric_leaderboard(
    metric: Category,
    researcher_id: Uuid,
    cohort: &[RankedEntry],
) -> MetricLeaderboard {
    let sorted = order_by(cohort, &metric_keys(metric));
    let top = sorted
        .iter()
        .take(LEADERBOARD_SIZE)
        .enumerate()
        .map(|(index, entry)| LeaderboardRow::new(index + 1, entry, metric))
        .collect();
    let my_points = sorted
        .iter()
        .find(|entry| entry.id() == researcher_id)
        .map(|entry| *entry.points.get(metric))
        .unwrap_or(0.0);

    MetricLeaderboard {
        metric,
        top,
        my_rank: position_of(researcher_id, &sorted),
        my_points,
        cohort_size: sorted.len(),
        chart: chart_slice(&sorted, researcher_id, metric),
    }
}

pub fn leaderboards(researcher_id: Uuid, cohort: &[RankedEntry]) -> Vec<MetricLeaderboard> {
    Category::LEADERBOARD_METRICS
        .into_iter()
        .map(|metric| metric_leaderboard(metric, researcher_id, cohort))
        .collect()
}

fn chart_slice(sorted: &[&RankedEntry], researcher_id: Uuid, metric: Category) -> Vec<LeaderboardRow> {
    let mut rows: Vec<LeaderboardRow> = sorted
        .iter()
        .take(CHART_SIZE)
        .enumerate()
        .map(|(index, entry)| LeaderboardRow::new(index + 1, entry, metric))
        .collect();

    if !rows.iter().any(|row| row.researcher_id == researcher_id) {
        if let Some((index, entry)) = sorted
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.id() == researcher_id)
        {
            rows.push(LeaderboardRow::new(index + 1, entry, metric));
        }
    }
    rows
}
