use chrono::NaiveDate;
use uuid::Uuid;

use crate::category::{Category, CategoryCounts, CategoryTable};
use crate::config::ScoringConfig;
use crate::models::{ActivityRecord, RankedEntry, Researcher};
use crate::scoring::{comparison_score, weighted_points};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

pub fn researcher(name: &str, college: &str, department: &str, title: &str) -> Researcher {
    Researcher {
        id: Uuid::new_v4(),
        name: name.to_string(),
        college: college.to_string(),
        department: department.to_string(),
        academic_title: title.to_string(),
    }
}

pub fn record(researcher_id: Uuid, category: Category, occurred_on: NaiveDate) -> ActivityRecord {
    ActivityRecord {
        researcher_id,
        category,
        occurred_on,
    }
}

/// Entry scored with the default comparison weights.
pub fn entry_with_counts(researcher: Researcher, pairs: &[(Category, u32)]) -> RankedEntry {
    let mut counts = CategoryCounts::default();
    for (category, count) in pairs {
        *counts.get_mut(*category) += count;
    }
    let weights = ScoringConfig::default().comparison_weights;
    RankedEntry {
        researcher,
        score: comparison_score(&counts, &weights),
        points: weighted_points(&counts, &weights),
        counts,
    }
}

/// Entry with a fixed score and no activity, for rank and band arithmetic.
pub fn entry(name: &str, college: &str, department: &str, title: &str, score: f64) -> RankedEntry {
    RankedEntry {
        researcher: researcher(name, college, department, title),
        counts: CategoryCounts::default(),
        score,
        points: CategoryTable::default(),
    }
}
