use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::category::{Category, CategoryCounts, CategoryTable};

/// An active researcher as listed by the cohort query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Researcher {
    pub id: Uuid,
    pub name: String,
    pub college: String,
    pub department: String,
    pub academic_title: String,
}

/// One dated occurrence of an activity, already normalised by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityRecord {
    pub researcher_id: Uuid,
    pub category: Category,
    pub occurred_on: NaiveDate,
}

/// Per-category target a researcher set for themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub category: Category,
    pub target: u32,
}

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn calendar_year(year: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }
}

/// A researcher projected into ranking space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub researcher: Researcher,
    pub counts: CategoryCounts,
    pub score: f64,
    pub points: CategoryTable<f64>,
}

impl RankedEntry {
    pub fn id(&self) -> Uuid {
        self.researcher.id
    }

    pub fn research_count(&self) -> u32 {
        self.counts.research
    }

    pub fn activity_count(&self) -> u32 {
        self.counts.total()
    }
}

/// Every active researcher for one request, with their activity ledger.
#[derive(Debug, Clone, Default)]
pub struct Cohort {
    pub entries: Vec<RankedEntry>,
    pub records: Vec<ActivityRecord>,
}

impl Cohort {
    pub fn find(&self, researcher_id: Uuid) -> Option<&RankedEntry> {
        self.entries.iter().find(|entry| entry.id() == researcher_id)
    }

    pub fn records_for(&self, researcher_id: Uuid) -> Vec<ActivityRecord> {
        self.records
            .iter()
            .filter(|record| record.researcher_id == researcher_id)
            .copied()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearBucket {
    pub year: i32,
    pub points: f64,
    pub research_points: f64,
    pub conference_points: f64,
    pub course_points: f64,
    pub activity_count: u32,
    pub is_current: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthBucket {
    pub month: u32,
    pub points: f64,
    pub research_points: f64,
    pub conference_points: f64,
    pub course_points: f64,
    pub activity_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityTrends {
    pub year: i32,
    pub yearly: Vec<YearBucket>,
    pub monthly: Vec<MonthBucket>,
    pub best_year: Option<i32>,
    pub best_month: Option<u32>,
}
