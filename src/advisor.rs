use serde::Serialize;

use crate::category::Category;
use crate::models::RankedEntry;
use crate::ranking::ScopedRanks;

/// Points added to the total score when projecting the next step.
pub const NEXT_STEP_BOOST: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "category", rename_all = "snake_case")]
pub enum Badge {
    TopThreeUniversity,
    TopTenUniversity,
    TopFiveCollege,
    Specialist(Category),
}

impl Badge {
    pub fn label(self) -> String {
        match self {
            Badge::TopThreeUniversity => "Top 3 in the university".to_string(),
            Badge::TopTenUniversity => "Top 10 in the university".to_string(),
            Badge::TopFiveCollege => "Top 5 in the college".to_string(),
            Badge::Specialist(category) => format!("Specialist in {}", category.label()),
        }
    }
}

/// Category with the most weighted points; `None` when every category is 0.
pub fn strongest_metric(entry: &RankedEntry) -> Option<Category> {
    let mut best: Option<(Category, f64)> = None;
    for (category, points) in entry.points.iter() {
        if *points > best.map_or(0.0, |(_, top)| top) {
            best = Some((category, *points));
        }
    }
    best.map(|(category, _)| category)
}

/// Leaderboard metric with the fewest weighted points, first one on ties.
pub fn weakest_metric(entry: &RankedEntry) -> Category {
    let mut weakest = Category::LEADERBOARD_METRICS[0];
    for category in Category::LEADERBOARD_METRICS {
        if entry.points.get(category) < entry.points.get(weakest) {
            weakest = category;
        }
    }
    weakest
}

pub fn badges(entry: &RankedEntry, ranks: &ScopedRanks) -> Vec<Badge> {
    let mut badges = Vec::new();
    let university = ranks.university.rank;
    if (1..=3).contains(&university) {
        badges.push(Badge::TopThreeUniversity);
    } else if (4..=10).contains(&university) {
        badges.push(Badge::TopTenUniversity);
    }
    if (1..=5).contains(&ranks.college.rank) {
        badges.push(Badge::TopFiveCollege);
    }
    if let Some(category) = strongest_metric(entry) {
        badges.push(Badge::Specialist(category));
    }
    badges
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextStep {
    pub focus: Category,
    pub current_score: f64,
    pub projected_score: f64,
    pub current_college_rank: usize,
    pub projected_college_rank: usize,
    pub estimated_college_rank_gain: usize,
}

/// Projects the college rank after `NEXT_STEP_BOOST` more points in the
/// weakest metric. Nothing is written anywhere.
pub fn next_step(
    entry: &RankedEntry,
    college: &[&RankedEntry],
    current_college_rank: usize,
) -> NextStep {
    let projected_score = entry.score + NEXT_STEP_BOOST;
    let ahead = college
        .iter()
        .filter(|peer| peer.id() != entry.id())
        .filter(|peer| peer.score > projected_score)
        .count();
    let projected_college_rank = ahead + 1;

    NextStep {
        focus: weakest_metric(entry),
        current_score: entry.score,
        projected_score,
        current_college_rank,
        projected_college_rank,
        estimated_college_rank_gain: current_college_rank.saturating_sub(projected_college_rank),
    }
}
