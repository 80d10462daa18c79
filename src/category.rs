use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Activity categories tracked by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Research,
    Conferences,
    Courses,
    Seminars,
    Workshops,
    Committees,
    Supervision,
    Reviewing,
    Journals,
    Positions,
    Volunteering,
    FieldVisits,
    Assignments,
    Certificates,
    ThankYouLetters,
}

impl Category {
    pub const ALL: [Category; 15] = [
        Category::Research,
        Category::Conferences,
        Category::Courses,
        Category::Seminars,
        Category::Workshops,
        Category::Committees,
        Category::Supervision,
        Category::Reviewing,
        Category::Journals,
        Category::Positions,
        Category::Volunteering,
        Category::FieldVisits,
        Category::Assignments,
        Category::Certificates,
        Category::ThankYouLetters,
    ];

    /// Categories that get their own leaderboard.
    pub const LEADERBOARD_METRICS: [Category; 11] = [
        Category::Research,
        Category::Conferences,
        Category::Courses,
        Category::Seminars,
        Category::Workshops,
        Category::Committees,
        Category::Supervision,
        Category::Reviewing,
        Category::Journals,
        Category::Positions,
        Category::Volunteering,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::Research => "research",
            Category::Conferences => "conferences",
            Category::Courses => "courses",
            Category::Seminars => "seminars",
            Category::Workshops => "workshops",
            Category::Committees => "committees",
            Category::Supervision => "supervision",
            Category::Reviewing => "reviewing",
            Category::Journals => "journals",
            Category::Positions => "positions",
            Category::Volunteering => "volunteering",
            Category::FieldVisits => "field_visits",
            Category::Assignments => "assignments",
            Category::Certificates => "certificates",
            Category::ThankYouLetters => "thank_you_letters",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Research => "Research outputs",
            Category::Conferences => "Conferences",
            Category::Courses => "Courses",
            Category::Seminars => "Seminars",
            Category::Workshops => "Workshops",
            Category::Committees => "Committees",
            Category::Supervision => "Student supervision",
            Category::Reviewing => "Peer reviewing",
            Category::Journals => "Journal memberships",
            Category::Positions => "Academic positions",
            Category::Volunteering => "Volunteering",
            Category::FieldVisits => "Field visits",
            Category::Assignments => "Assignments",
            Category::Certificates => "Certificates",
            Category::ThankYouLetters => "Thank-you letters",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown activity category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Category::ALL
            .into_iter()
            .find(|category| category.key() == normalized)
            .ok_or_else(|| UnknownCategory(value.to_string()))
    }
}

/// One value per category. Adding a category without extending this table is a
/// compile error, and deserializing a table with a missing category fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryTable<T> {
    pub research: T,
    pub conferences: T,
    pub courses: T,
    pub seminars: T,
    pub workshops: T,
    pub committees: T,
    pub supervision: T,
    pub reviewing: T,
    pub journals: T,
    pub positions: T,
    pub volunteering: T,
    pub field_visits: T,
    pub assignments: T,
    pub certificates: T,
    pub thank_you_letters: T,
}

/// Integer activity counts per category.
pub type CategoryCounts = CategoryTable<u32>;

impl<T> CategoryTable<T> {
    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> Self {
        Self {
            research: f(Category::Research),
            conferences: f(Category::Conferences),
            courses: f(Category::Courses),
            seminars: f(Category::Seminars),
            workshops: f(Category::Workshops),
            committees: f(Category::Committees),
            supervision: f(Category::Supervision),
            reviewing: f(Category::Reviewing),
            journals: f(Category::Journals),
            positions: f(Category::Positions),
            volunteering: f(Category::Volunteering),
            field_visits: f(Category::FieldVisits),
            assignments: f(Category::Assignments),
            certificates: f(Category::Certificates),
            thank_you_letters: f(Category::ThankYouLetters),
        }
    }

    pub fn get(&self, category: Category) -> &T {
        match category {
            Category::Research => &self.research,
            Category::Conferences => &self.conferences,
            Category::Courses => &self.courses,
            Category::Seminars => &self.seminars,
            Category::Workshops => &self.workshops,
            Category::Committees => &self.committees,
            Category::Supervision => &self.supervision,
            Category::Reviewing => &self.reviewing,
            Category::Journals => &self.journals,
            Category::Positions => &self.positions,
            Category::Volunteering => &self.volunteering,
            Category::FieldVisits => &self.field_visits,
            Category::Assignments => &self.assignments,
            Category::Certificates => &self.certificates,
            Category::ThankYouLetters => &self.thank_you_letters,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut T {
        match category {
            Category::Research => &mut self.research,
            Category::Conferences => &mut self.conferences,
            Category::Courses => &mut self.courses,
            Category::Seminars => &mut self.seminars,
            Category::Workshops => &mut self.workshops,
            Category::Committees => &mut self.committees,
            Category::Supervision => &mut self.supervision,
            Category::Reviewing => &mut self.reviewing,
            Category::Journals => &mut self.journals,
            Category::Positions => &mut self.positions,
            Category::Volunteering => &mut self.volunteering,
            Category::FieldVisits => &mut self.field_visits,
            Category::Assignments => &mut self.assignments,
            Category::Certificates => &mut self.certificates,
            Category::ThankYouLetters => &mut self.thank_you_letters,
        }
    }

    /// Iterates in `Category::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> + '_ {
        Category::ALL.into_iter().map(move |category| (category, self.get(category)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Category, &T) -> U) -> CategoryTable<U> {
        CategoryTable::from_fn(|category| f(category, self.get(category)))
    }
}

impl CategoryCounts {
    pub fn total(&self) -> u32 {
        self.iter().map(|(_, count)| *count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_from_str() {
        for category in Category::ALL {
            assert_eq!(category.key().parse::<Category>(), Ok(category));
        }
        assert_eq!("Field Visits".parse::<Category>(), Ok(Category::FieldVisits));
        assert_eq!("thank-you-letters".parse::<Category>(), Ok(Category::ThankYouLetters));
        assert!("hackathons".parse::<Category>().is_err());
    }

    #[test]
    fn table_accessors_agree_with_iteration_order() {
        let mut table = CategoryTable::from_fn(|category| category as u32);
        *table.get_mut(Category::Journals) += 100;

        let collected: Vec<(Category, u32)> = table.iter().map(|(c, v)| (c, *v)).collect();
        assert_eq!(collected.len(), 15);
        assert_eq!(collected[0], (Category::Research, 0));
        assert_eq!(*table.get(Category::Journals), Category::Journals as u32 + 100);
        assert_eq!(collected[14].0, Category::ThankYouLetters);
    }

    #[test]
    fn leaderboard_metrics_are_distinct() {
        let mut metrics = Category::LEADERBOARD_METRICS.to_vec();
        metrics.sort();
        metrics.dedup();
        assert_eq!(metrics.len(), 11);
    }

    #[test]
    fn table_with_missing_category_fails_to_deserialize() {
        let json = r#"{"research": 1}"#;
        assert!(serde_json::from_str::<CategoryTable<u32>>(json).is_err());
    }

    #[test]
    fn empty_counts_total_zero() {
        assert_eq!(CategoryCounts::default().total(), 0);
    }
}
