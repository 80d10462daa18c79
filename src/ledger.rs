use std::path::Path;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::category::{Category, UnknownCategory};
use crate::models::{ActivityRecord, Goal, Researcher};

/// Read side of the activity store.
///
/// Activity reads are batched per category: one call covers every requested
/// researcher, so loading a cohort costs one read per category.
#[allow(async_fn_in_trait)]
pub trait ActivityLedger {
    /// Active members with the "researcher" role.
    async fn list_active_researchers(&self) -> Result<Vec<Researcher>, LedgerError>;

    async fn list_activity_dates(
        &self,
        researcher_ids: &[Uuid],
        category: Category,
    ) -> Result<Vec<ActivityRecord>, LedgerError>;

    /// Standing goals (no year) come before goals pinned to `year`.
    async fn list_goals(
        &self,
        researcher_id: Uuid,
        year: Option<i32>,
    ) -> Result<Vec<Goal>, LedgerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("dataset error in {file}: {source}")]
    Dataset {
        file: String,
        #[source]
        source: csv::Error,
    },
    #[error("dataset error in {file}: {source}")]
    Category {
        file: String,
        #[source]
        source: UnknownCategory,
    },
}

/// Ledger held entirely in memory, loaded from CSV files or built in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    researchers: Vec<Researcher>,
    records: Vec<ActivityRecord>,
    goals: Vec<(Uuid, Option<i32>, Goal)>,
}

impl MemoryLedger {
    pub fn new(researchers: Vec<Researcher>, records: Vec<ActivityRecord>) -> Self {
        Self {
            researchers,
            records,
            goals: Vec::new(),
        }
    }

    pub fn with_goal(mut self, researcher_id: Uuid, year: Option<i32>, goal: Goal) -> Self {
        self.goals.push((researcher_id, year, goal));
        self
    }

    /// Loads `researchers.csv`, `activities.csv`, and the optional `goals.csv`.
    pub fn from_dir(dir: &Path) -> Result<Self, LedgerError> {
        #[derive(serde::Deserialize)]
        struct ResearcherRow {
            id: Uuid,
            name: String,
            college: String,
            department: String,
            academic_title: String,
        }

        #[derive(serde::Deserialize)]
        struct ActivityRow {
            researcher_id: Uuid,
            category: String,
            occurred_on: NaiveDate,
        }

        #[derive(serde::Deserialize)]
        struct GoalRow {
            researcher_id: Uuid,
            category: String,
            target: u32,
            year: Option<i32>,
        }

        let researchers = read_rows::<ResearcherRow>(&dir.join("researchers.csv"))?
            .into_iter()
            .map(|row| Researcher {
                id: row.id,
                name: row.name,
                college: row.college,
                department: row.department,
                academic_title: row.academic_title,
            })
            .collect();

        let activities_file = dir.join("activities.csv");
        let records = read_rows::<ActivityRow>(&activities_file)?
            .into_iter()
            .map(|row| {
                let category = parse_category(&activities_file, &row.category)?;
                Ok(ActivityRecord {
                    researcher_id: row.researcher_id,
                    category,
                    occurred_on: row.occurred_on,
                })
            })
            .collect::<Result<Vec<_>, LedgerError>>()?;

        let mut ledger = Self::new(researchers, records);

        let goals_file = dir.join("goals.csv");
        if goals_file.exists() {
            for row in read_rows::<GoalRow>(&goals_file)? {
                let category = parse_category(&goals_file, &row.category)?;
                ledger = ledger.with_goal(
                    row.researcher_id,
                    row.year,
                    Goal {
                        category,
                        target: row.target,
                    },
                );
            }
        }

        tracing::info!(
            dir = %dir.display(),
            researchers = ledger.researchers.len(),
            records = ledger.records.len(),
            goals = ledger.goals.len(),
            "loaded dataset"
        );
        Ok(ledger)
    }
}

fn read_rows<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, LedgerError> {
    let dataset_error = |source| LedgerError::Dataset {
        file: path.display().to_string(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(dataset_error)?;
    reader
        .deserialize::<T>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(dataset_error)
}

fn parse_category(path: &Path, value: &str) -> Result<Category, LedgerError> {
    value.parse().map_err(|source| LedgerError::Category {
        file: path.display().to_string(),
        source,
    })
}

impl ActivityLedger for MemoryLedger {
    async fn list_active_researchers(&self) -> Result<Vec<Researcher>, LedgerError> {
        Ok(self.researchers.clone())
    }

    async fn list_activity_dates(
        &self,
        researcher_ids: &[Uuid],
        category: Category,
    ) -> Result<Vec<ActivityRecord>, LedgerError> {
        Ok(self
            .records
            .iter()
            .filter(|record| {
                record.category == category && researcher_ids.contains(&record.researcher_id)
            })
            .copied()
            .collect())
    }

    async fn list_goals(
        &self,
        researcher_id: Uuid,
        year: Option<i32>,
    ) -> Result<Vec<Goal>, LedgerError> {
        let standing = self
            .goals
            .iter()
            .filter(|(id, goal_year, _)| *id == researcher_id && goal_year.is_none());
        let pinned = self.goals.iter().filter(|(id, goal_year, _)| {
            *id == researcher_id && goal_year.is_some() && *goal_year == year
        });
        Ok(standing.chain(pinned).map(|(_, _, goal)| *goal).collect())
    }
}
