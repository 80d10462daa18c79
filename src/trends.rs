use std::collections::BTreeMap;

use chrono::Datelike;

use crate::category::{Category, CategoryTable};
use crate::models::{ActivityRecord, ActivityTrends, MonthBucket, YearBucket};

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    points: f64,
    research_points: f64,
    conference_points: f64,
    course_points: f64,
    activity_count: u32,
}

impl Tally {
    fn add(&mut self, category: Category, points: f64) {
        self.points += points;
        self.activity_count += 1;
        match category {
            Category::Research => self.research_points += points,
            Category::Conferences => self.conference_points += points,
            Category::Courses => self.course_points += points,
            _ => {}
        }
    }
}

/// Buckets a researcher's full history by year, and `year`'s records by month.
///
/// The yearly view always includes `year`; the monthly view always has twelve
/// buckets. Best buckets must have strictly positive points, and ties go to
/// the earliest bucket.
pub fn summarize(
    records: &[ActivityRecord],
    point_values: &CategoryTable<f64>,
    year: i32,
) -> ActivityTrends {
    let mut years: BTreeMap<i32, Tally> = BTreeMap::new();
    years.entry(year).or_default();
    let mut months = [Tally::default(); 12];

    for record in records {
        let points = *point_values.get(record.category);
        let record_year = record.occurred_on.year();
        years.entry(record_year).or_default().add(record.category, points);
        if record_year == year {
            months[record.occurred_on.month0() as usize].add(record.category, points);
        }
    }

    let yearly: Vec<YearBucket> = years
        .into_iter()
        .map(|(bucket_year, tally)| YearBucket {
            year: bucket_year,
            points: tally.points,
            research_points: tally.research_points,
            conference_points: tally.conference_points,
            course_points: tally.course_points,
            activity_count: tally.activity_count,
            is_current: bucket_year == year,
        })
        .collect();

    let monthly: Vec<MonthBucket> = months
        .iter()
        .zip(1u32..)
        .map(|(tally, month)| MonthBucket {
            month,
            points: tally.points,
            research_points: tally.research_points,
            conference_points: tally.conference_points,
            course_points: tally.course_points,
            activity_count: tally.activity_count,
        })
        .collect();

    ActivityTrends {
        year,
        best_year: best(yearly.iter().map(|bucket| (bucket.year, bucket.points))),
        best_month: best(monthly.iter().map(|bucket| (bucket.month, bucket.points))),
        yearly,
        monthly,
    }
}

fn best<K>(buckets: impl Iterator<Item = (K, f64)>) -> Option<K> {
    let mut best: Option<(K, f64)> = None;
    for (key, points) in buckets {
        let threshold = best.as_ref().map_or(0.0, |(_, top)| *top);
        if points > threshold {
            best = Some((key, points));
        }
    }
    best.map(|(key, _)| key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::test_support::{date, record};
    use uuid::Uuid;

    #[test]
    fn buckets_by_year_and_current_year_month() {
        let me = Uuid::new_v4();
        let points = ScoringConfig::default().comparison_weights;
        let records = vec![
            record(me, Category::Research, date(2023, 4, 2)),
            record(me, Category::Research, date(2025, 3, 9)),
            record(me, Category::Conferences, date(2025, 3, 20)),
            record(me, Category::Volunteering, date(2025, 11, 1)),
        ];

        let trends = summarize(&records, &points, 2025);
        let years: Vec<(i32, f64, bool)> = trends
            .yearly
            .iter()
            .map(|b| (b.year, b.points, b.is_current))
            .collect();
        assert_eq!(years, vec![(2023, 5.0, false), (2025, 8.0, true)]);

        assert_eq!(trends.monthly.len(), 12);
        let march = &trends.monthly[2];
        assert_eq!(march.month, 3);
        assert_eq!(march.points, 7.0);
        assert_eq!(march.research_points, 5.0);
        assert_eq!(march.conference_points, 2.0);
        assert_eq!(trends.monthly[3].points, 0.0);

        assert_eq!(trends.best_year, Some(2025));
        assert_eq!(trends.best_month, Some(3));
    }

    #[test]
    fn ties_pick_the_earliest_bucket() {
        let me = Uuid::new_v4();
        let points = ScoringConfig::default().comparison_weights;
        let records = vec![
            record(me, Category::Courses, date(2022, 1, 1)),
            record(me, Category::Committees, date(2024, 5, 1)),
            record(me, Category::Courses, date(2024, 2, 1)),
        ];
        let trends = summarize(&records, &points, 2024);
        assert_eq!(trends.best_year, Some(2024));
        assert_eq!(trends.best_month, Some(2));

        let tied = vec![
            record(me, Category::Courses, date(2022, 1, 1)),
            record(me, Category::Courses, date(2024, 1, 1)),
        ];
        assert_eq!(summarize(&tied, &points, 2024).best_year, Some(2022));
    }

    #[test]
    fn empty_history_has_no_best_bucket() {
        let trends = summarize(&[], &ScoringConfig::default().comparison_weights, 2026);
        assert_eq!(trends.yearly.len(), 1);
        assert!(trends.yearly[0].is_current);
        assert_eq!(trends.best_year, None);
        assert_eq!(trends.best_month, None);
    }

    #[test]
    fn best_year_matches_maximum_points() {
        let me = Uuid::new_v4();
        let points = ScoringConfig::default().comparison_weights;
        let records: Vec<_> = (2018..2024)
            .flat_map(|year| {
                (0..(year % 4) as u32).map(move |day| record(me, Category::Journals, date(year, 6, day + 1)))
            })
            .collect();
        let trends = summarize(&records, &points, 2024);
        let max = trends.yearly.iter().map(|b| b.points).fold(0.0, f64::max);
        let best = trends.best_year.expect("some activity");
        let best_bucket = trends.yearly.iter().find(|b| b.year == best).expect("bucket exists");
        assert_eq!(best_bucket.points, max);
    }
}
