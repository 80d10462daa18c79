use std::collections::HashMap;

use uuid::Uuid;

use crate::category::{Category, CategoryCounts};
use crate::ledger::{ActivityLedger, LedgerError};
use crate::models::{ActivityRecord, DateRange};

/// Counts one researcher's records per category. Every category is present;
/// categories without matching records count 0.
pub fn aggregate(
    researcher_id: Uuid,
    records: &[ActivityRecord],
    range: Option<&DateRange>,
) -> CategoryCounts {
    let mut counts = CategoryCounts::default();
    for record in records
        .iter()
        .filter(|record| record.researcher_id == researcher_id)
        .filter(|record| in_range(record, range))
    {
        *counts.get_mut(record.category) += 1;
    }
    counts
}

/// Counts every researcher in one pass over a cohort-wide ledger.
pub fn aggregate_cohort(
    records: &[ActivityRecord],
    range: Option<&DateRange>,
) -> HashMap<Uuid, CategoryCounts> {
    let mut counts: HashMap<Uuid, CategoryCounts> = HashMap::new();
    for record in records.iter().filter(|record| in_range(record, range)) {
        *counts
            .entry(record.researcher_id)
            .or_default()
            .get_mut(record.category) += 1;
    }
    counts
}

fn in_range(record: &ActivityRecord, range: Option<&DateRange>) -> bool {
    range.map_or(true, |range| range.contains(record.occurred_on))
}

/// Reads every category for the given researchers, one ledger call per category.
pub async fn read_ledger<L: ActivityLedger>(
    ledger: &L,
    researcher_ids: &[Uuid],
) -> Result<Vec<ActivityRecord>, LedgerError> {
    let mut records = Vec::new();
    if researcher_ids.is_empty() {
        return Ok(records);
    }

    for category in Category::ALL {
        let batch = ledger.list_activity_dates(researcher_ids, category).await?;
        tracing::debug!(%category, rows = batch.len(), "read activity batch");
        records.extend(batch);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::test_support::{date, record, researcher};

    #[test]
    fn counts_every_category_and_ignores_other_researchers() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let records = vec![
            record(me, Category::Research, date(2024, 1, 5)),
            record(me, Category::Research, date(2024, 7, 5)),
            record(me, Category::ThankYouLetters, date(2023, 2, 1)),
            record(other, Category::Research, date(2024, 1, 5)),
        ];

        let counts = aggregate(me, &records, None);
        assert_eq!(counts.research, 2);
        assert_eq!(counts.thank_you_letters, 1);
        assert_eq!(counts.conferences, 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let me = Uuid::new_v4();
        let records = vec![
            record(me, Category::Committees, date(2024, 1, 1)),
            record(me, Category::Committees, date(2024, 6, 30)),
            record(me, Category::Committees, date(2024, 7, 1)),
            record(me, Category::Committees, date(2023, 12, 31)),
        ];
        let range = DateRange {
            start: date(2024, 1, 1),
            end: date(2024, 6, 30),
        };

        assert_eq!(aggregate(me, &records, Some(&range)).committees, 2);
    }

    #[test]
    fn researcher_without_activity_yields_all_zero_counts() {
        let counts = aggregate(Uuid::new_v4(), &[], None);
        assert_eq!(counts, CategoryCounts::default());
    }

    #[test]
    fn cohort_aggregation_matches_single_aggregation() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let records = vec![
            record(a, Category::Research, date(2024, 1, 5)),
            record(b, Category::Courses, date(2024, 1, 5)),
            record(b, Category::Courses, date(2022, 1, 5)),
        ];
        let range = DateRange::calendar_year(2024);

        let cohort = aggregate_cohort(&records, range.as_ref());
        assert_eq!(cohort[&a], aggregate(a, &records, range.as_ref()));
        assert_eq!(cohort[&b].courses, 1);
    }

    #[tokio::test]
    async fn read_ledger_collects_all_categories() {
        let alice = researcher("Alice", "Science", "Physics", "Professor");
        let ledger = MemoryLedger::new(
            vec![alice.clone()],
            vec![
                record(alice.id, Category::Research, date(2024, 1, 5)),
                record(alice.id, Category::Certificates, date(2024, 2, 5)),
            ],
        );

        let records = read_ledger(&ledger, &[alice.id]).await.expect("read succeeds");
        assert_eq!(records.len(), 2);
        assert!(read_ledger(&ledger, &[]).await.expect("read succeeds").is_empty());
    }
}
