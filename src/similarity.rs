use serde::Serialize;
use uuid::Uuid;

use crate::category::Category;
use crate::models::RankedEntry;

const BAND: f64 = 0.15;
const MIN_SHARED_CANDIDATES: usize = 6;
const MAX_SIMILAR: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedTag {
    SameAcademicTitle,
    SameCollege,
    SameDepartment,
}

impl SharedTag {
    pub fn label(self) -> &'static str {
        match self {
            SharedTag::SameAcademicTitle => "same academic title",
            SharedTag::SameCollege => "same college",
            SharedTag::SameDepartment => "same department",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarResearcher {
    pub researcher_id: Uuid,
    pub name: String,
    pub college: String,
    pub academic_title: String,
    pub score: f64,
    pub distance: f64,
    pub shared_tags: Vec<SharedTag>,
}

/// Manhattan distance over the weighted-points vectors.
pub fn distance(a: &RankedEntry, b: &RankedEntry) -> f64 {
    Category::ALL
        .into_iter()
        .map(|category| (a.points.get(category) - b.points.get(category)).abs())
        .sum()
}

pub fn shared_tags(me: &RankedEntry, other: &RankedEntry) -> Vec<SharedTag> {
    let mut tags = Vec::new();
    if me.researcher.academic_title == other.researcher.academic_title {
        tags.push(SharedTag::SameAcademicTitle);
    }
    if me.researcher.college == other.researcher.college {
        tags.push(SharedTag::SameCollege);
    }
    if me.researcher.department == other.researcher.department {
        tags.push(SharedTag::SameDepartment);
    }
    tags
}

fn shares_title_or_college(me: &RankedEntry, other: &RankedEntry) -> bool {
    me.researcher.academic_title == other.researcher.academic_title
        || me.researcher.college == other.researcher.college
}

/// Up to 12 peers within ±15% of `me.score`, nearest first.
///
/// Peers sharing an academic title or college are preferred; if fewer than six
/// of those exist, every other in-band peer is considered too.
pub fn find_similar(me: &RankedEntry, cohort: &[RankedEntry]) -> Vec<SimilarResearcher> {
    let low = me.score * (1.0 - BAND);
    let high = me.score * (1.0 + BAND);
    let in_band: Vec<&RankedEntry> = cohort
        .iter()
        .filter(|entry| entry.id() != me.id())
        .filter(|entry| entry.score >= low && entry.score <= high)
        .collect();

    let mut candidates: Vec<&RankedEntry> = in_band
        .iter()
        .copied()
        .filter(|entry| shares_title_or_college(me, entry))
        .collect();

    if candidates.len() < MIN_SHARED_CANDIDATES {
        let widened: Vec<&RankedEntry> = in_band
            .iter()
            .copied()
            .filter(|entry| !shares_title_or_college(me, entry))
            .collect();
        tracing::debug!(
            shared = candidates.len(),
            widened = widened.len(),
            "widening similarity search"
        );
        candidates.extend(widened);
    }

    let mut scored: Vec<(f64, &RankedEntry)> = candidates
        .into_iter()
        .map(|entry| (distance(me, entry), entry))
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));

    scored
        .into_iter()
        .take(MAX_SIMILAR)
        .map(|(distance, entry)| SimilarResearcher {
            researcher_id: entry.id(),
            name: entry.researcher.name.clone(),
            college: entry.researcher.college.clone(),
            academic_title: entry.researcher.academic_title.clone(),
            score: entry.score,
            distance,
            shared_tags: shared_tags(me, entry),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{entry, entry_with_counts, researcher};

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = entry_with_counts(
            researcher("A", "Science", "Physics", "Lecturer"),
            &[(Category::Research, 3), (Category::Courses, 1)],
        );
        let b = entry_with_counts(
            researcher("B", "Arts", "History", "Professor"),
            &[(Category::Research, 1), (Category::Committees, 2)],
        );
        assert_eq!(distance(&a, &b), distance(&b, &a));
        // research 10 + courses 2 + committees 4
        assert_eq!(distance(&a, &b), 16.0);
        assert_eq!(distance(&a, &a), 0.0);
    }

    #[test]
    fn only_in_band_peers_are_returned() {
        let cohort = vec![
            entry("Me", "Science", "Physics", "Lecturer", 100.0),
            entry("Low", "Science", "Physics", "Lecturer", 84.0),
            entry("Edge", "Science", "Physics", "Lecturer", 114.0),
            entry("High", "Science", "Physics", "Lecturer", 116.0),
        ];
        let similar = find_similar(&cohort[0], &cohort);
        let names: Vec<&str> = similar.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Edge"]);
        assert_eq!(
            similar[0].shared_tags,
            vec![SharedTag::SameAcademicTitle, SharedTag::SameCollege, SharedTag::SameDepartment]
        );
    }

    #[test]
    fn widens_to_unrelated_peers_when_few_share_attributes() {
        let cohort = vec![
            entry("Me", "Science", "Physics", "Lecturer", 100.0),
            entry("Peer", "Science", "Chemistry", "Professor", 100.0),
            entry("Stranger", "Arts", "History", "Professor", 100.0),
        ];
        let similar = find_similar(&cohort[0], &cohort);
        assert_eq!(similar.len(), 2);
        let stranger = similar.iter().find(|s| s.name == "Stranger").expect("widened");
        assert!(stranger.shared_tags.is_empty());
    }

    #[test]
    fn no_widening_when_enough_peers_share_attributes() {
        let mut cohort = vec![entry("Me", "Science", "Physics", "Lecturer", 100.0)];
        for i in 0..6 {
            cohort.push(entry(&format!("Peer{i}"), "Science", "Physics", "Professor", 100.0));
        }
        cohort.push(entry("Stranger", "Arts", "History", "Professor", 100.0));

        let similar = find_similar(&cohort[0], &cohort);
        assert_eq!(similar.len(), 6);
        assert!(similar.iter().all(|s| s.name != "Stranger"));
    }

    #[test]
    fn results_are_nearest_first_and_capped() {
        let me = entry_with_counts(
            researcher("Me", "Science", "Physics", "Lecturer"),
            &[(Category::Research, 4), (Category::Courses, 10)],
        );
        let mut cohort = vec![me.clone()];
        for i in 0..10u32 {
            cohort.push(entry_with_counts(
                researcher(&format!("Mirror{i}"), "Science", "Physics", "Lecturer"),
                &[(Category::Research, 4), (Category::Courses, 10)],
            ));
            cohort.push(entry_with_counts(
                researcher(&format!("Shifted{i}"), "Science", "Physics", "Lecturer"),
                &[(Category::Research, 8)],
            ));
        }

        let similar = find_similar(&me, &cohort);
        assert_eq!(similar.len(), MAX_SIMILAR);
        assert!(similar[..10].iter().all(|s| s.distance == 0.0));
        assert!(similar.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn lone_researcher_has_no_similar_peers() {
        let cohort = vec![entry("Me", "Science", "Physics", "Lecturer", 42.0)];
        assert!(find_similar(&cohort[0], &cohort).is_empty());
    }
}
