use serde::Serialize;

use crate::category::{Category, CategoryCounts, CategoryTable};
use crate::config::ScoringConfig;
use crate::models::Goal;

/// Bounded 0..=100 evaluation score. Each category saturates at its cap.
pub fn bounded_score(
    counts: &CategoryCounts,
    weights: &CategoryTable<f64>,
    caps: &CategoryTable<f64>,
) -> u32 {
    let total: f64 = Category::ALL
        .into_iter()
        .map(|category| contribution(*counts.get(category), *weights.get(category), *caps.get(category)))
        .sum();
    total.min(100.0).max(0.0).round() as u32
}

fn saturated_ratio(count: u32, cap: f64) -> f64 {
    if cap > 0.0 {
        (f64::from(count) / cap).min(1.0)
    } else {
        0.0
    }
}

fn contribution(count: u32, weight: f64, cap: f64) -> f64 {
    saturated_ratio(count, cap) * weight
}

/// Unbounded weighted sum used only to order researchers against each other.
pub fn comparison_score(counts: &CategoryCounts, weights: &CategoryTable<f64>) -> f64 {
    weighted_points(counts, weights).iter().map(|(_, points)| *points).sum()
}

/// `count × weight` per category.
pub fn weighted_points(counts: &CategoryCounts, weights: &CategoryTable<f64>) -> CategoryTable<f64> {
    counts.map(|category, count| f64::from(*count) * *weights.get(category))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryEvaluation {
    pub category: Category,
    pub count: u32,
    pub cap: f64,
    pub weight: f64,
    pub ratio: f64,
    pub contribution: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<u32>,
    /// `None` when no goal is set for the category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievement_percent: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub score: u32,
    pub breakdown: Vec<CategoryEvaluation>,
}

impl Evaluation {
    /// Categories ordered by contribution, highest first.
    pub fn strongest(&self, n: usize) -> Vec<&CategoryEvaluation> {
        let mut ranked: Vec<&CategoryEvaluation> = self.breakdown.iter().collect();
        ranked.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));
        ranked.into_iter().take(n).collect()
    }

    /// Categories furthest from their cap, weighted by what they could still add.
    pub fn weakest(&self, n: usize) -> Vec<&CategoryEvaluation> {
        let mut ranked: Vec<&CategoryEvaluation> = self.breakdown.iter().collect();
        ranked.sort_by(|a, b| {
            let a_gap = a.weight - a.contribution;
            let b_gap = b.weight - b.contribution;
            b_gap.total_cmp(&a_gap)
        });
        ranked.into_iter().take(n).collect()
    }
}

/// Later goals for the same category replace earlier ones.
pub fn goal_table(goals: &[Goal]) -> CategoryTable<Option<u32>> {
    let mut table = CategoryTable::default();
    for goal in goals {
        *table.get_mut(goal.category) = Some(goal.target);
    }
    table
}

pub fn evaluate(
    counts: &CategoryCounts,
    config: &ScoringConfig,
    goals: &CategoryTable<Option<u32>>,
) -> Evaluation {
    let breakdown = Category::ALL
        .into_iter()
        .map(|category| {
            let count = *counts.get(category);
            let cap = *config.evaluation_caps.get(category);
            let weight = *config.evaluation_weights.get(category);
            let goal = *goals.get(category);
            CategoryEvaluation {
                category,
                count,
                cap,
                weight,
                ratio: saturated_ratio(count, cap),
                contribution: contribution(count, weight, cap),
                goal,
                achievement_percent: goal.and_then(|target| achievement_percent(count, target)),
            }
        })
        .collect();

    Evaluation {
        score: bounded_score(counts, &config.evaluation_weights, &config.evaluation_caps),
        breakdown,
    }
}

fn achievement_percent(count: u32, target: u32) -> Option<u32> {
    if target == 0 {
        return None;
    }
    let percent = 100.0 * f64::from(count) / f64::from(target);
    Some(percent.min(100.0).round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(Category, u32)]) -> CategoryCounts {
        let mut counts = CategoryCounts::default();
        for (category, count) in pairs {
            *counts.get_mut(*category) = *count;
        }
        counts
    }

    #[test]
    fn zero_activity_scores_zero_on_both_scales() {
        let config = ScoringConfig::default();
        let empty = CategoryCounts::default();
        assert_eq!(
            bounded_score(&empty, &config.evaluation_weights, &config.evaluation_caps),
            0
        );
        assert_eq!(comparison_score(&empty, &config.comparison_weights), 0.0);
    }

    #[test]
    fn partial_progress_rounds_weighted_ratios() {
        let mut weights = CategoryTable::<f64>::default();
        weights.research = 25.0;
        weights.conferences = 10.0;
        let mut caps = CategoryTable::from_fn(|_| 1.0);
        caps.research = 8.0;
        caps.conferences = 6.0;

        let counts = counts(&[(Category::Research, 2), (Category::Conferences, 1)]);
        // 6.25 + 1.667
        assert_eq!(bounded_score(&counts, &weights, &caps), 8);
    }

    #[test]
    fn maxing_every_category_scores_exactly_one_hundred() {
        let config = ScoringConfig::default();
        let saturated = CategoryCounts::from_fn(|_| 1_000);
        assert_eq!(
            bounded_score(&saturated, &config.evaluation_weights, &config.evaluation_caps),
            100
        );
    }

    #[test]
    fn bounded_score_never_decreases_with_more_activity() {
        let config = ScoringConfig::default();
        for category in Category::ALL {
            let mut previous = 0;
            for count in 0..20 {
                let score = bounded_score(
                    &counts(&[(category, count), (Category::Research, 3)]),
                    &config.evaluation_weights,
                    &config.evaluation_caps,
                );
                assert!(score >= previous, "{category} dropped at {count}");
                previous = score;
            }
        }
    }

    #[test]
    fn bounded_score_is_capped_even_with_oversized_weights() {
        let weights = CategoryTable::from_fn(|_| 50.0);
        let caps = CategoryTable::from_fn(|_| 1.0);
        assert_eq!(bounded_score(&CategoryCounts::from_fn(|_| 3), &weights, &caps), 100);
    }

    #[test]
    fn comparison_score_does_not_saturate() {
        let config = ScoringConfig::default();
        let modest = counts(&[(Category::Research, 10)]);
        let prolific = counts(&[(Category::Research, 40)]);
        assert_eq!(comparison_score(&modest, &config.comparison_weights), 50.0);
        assert_eq!(comparison_score(&prolific, &config.comparison_weights), 200.0);
    }

    #[test]
    fn achievement_is_omitted_without_a_goal() {
        let config = ScoringConfig::default();
        let goals = goal_table(&[
            Goal { category: Category::Research, target: 4 },
            Goal { category: Category::Research, target: 8 },
            Goal { category: Category::Courses, target: 0 },
        ]);
        let evaluation = evaluate(
            &counts(&[(Category::Research, 2), (Category::Conferences, 9)]),
            &config,
            &goals,
        );

        let research = &evaluation.breakdown[0];
        assert_eq!(research.goal, Some(8));
        assert_eq!(research.achievement_percent, Some(25));
        let conferences = &evaluation.breakdown[1];
        assert_eq!(conferences.goal, None);
        assert_eq!(conferences.achievement_percent, None);
        assert_eq!(conferences.ratio, 1.0);
        let courses = &evaluation.breakdown[2];
        assert_eq!(courses.achievement_percent, None);
    }

    #[test]
    fn strongest_and_weakest_follow_contribution() {
        let config = ScoringConfig::default();
        let evaluation = evaluate(
            &counts(&[(Category::Research, 8), (Category::Journals, 1)]),
            &config,
            &CategoryTable::default(),
        );
        assert_eq!(evaluation.strongest(1)[0].category, Category::Research);
        assert_ne!(evaluation.weakest(1)[0].category, Category::Research);
    }
}
