use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::category::Category;
use crate::ledger::{ActivityLedger, LedgerError};
use crate::models::{ActivityRecord, Goal, Researcher};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Source table and the column that dates an activity in it.
fn source(category: Category) -> (&'static str, &'static str) {
    match category {
        Category::Research => ("research_outputs", "publication_date"),
        Category::Conferences => ("conferences", "start_date"),
        Category::Courses => ("courses", "start_date"),
        Category::Seminars => ("seminars", "seminar_date"),
        Category::Workshops => ("workshops", "start_date"),
        Category::Committees => ("committees", "assignment_date"),
        Category::Supervision => ("supervisions", "start_date"),
        Category::Reviewing => ("reviews", "review_date"),
        Category::Journals => ("journal_memberships", "join_date"),
        Category::Positions => ("positions", "start_date"),
        Category::Volunteering => ("volunteering", "activity_date"),
        Category::FieldVisits => ("field_visits", "visit_date"),
        Category::Assignments => ("assignments", "assignment_date"),
        Category::Certificates => ("certificates", "issue_date"),
        Category::ThankYouLetters => ("thank_you_letters", "created_at"),
    }
}

/// Postgres-backed ledger.
#[derive(Debug, Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ActivityLedger for PgLedger {
    async fn list_active_researchers(&self) -> Result<Vec<Researcher>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT id, full_name, college, department, academic_title
            FROM portal.researchers
            WHERE is_active AND role = 'researcher'
            ORDER BY full_name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Researcher {
                id: row.get("id"),
                name: row.get("full_name"),
                college: row.get("college"),
                department: row.get("department"),
                academic_title: row.get("academic_title"),
            })
            .collect())
    }

    async fn list_activity_dates(
        &self,
        researcher_ids: &[Uuid],
        category: Category,
    ) -> Result<Vec<ActivityRecord>, LedgerError> {
        let (table, column) = source(category);
        let query = format!(
            "SELECT researcher_id, {column}::date AS occurred_on \
             FROM portal.{table} \
             WHERE researcher_id = ANY($1) AND {column} IS NOT NULL"
        );

        let rows = sqlx::query(&query)
            .bind(researcher_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| ActivityRecord {
                researcher_id: row.get("researcher_id"),
                category,
                occurred_on: row.get("occurred_on"),
            })
            .collect())
    }

    async fn list_goals(
        &self,
        researcher_id: Uuid,
        year: Option<i32>,
    ) -> Result<Vec<Goal>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT category, target
            FROM portal.goals
            WHERE researcher_id = $1 AND (year IS NULL OR year = $2)
            ORDER BY year NULLS FIRST
            "#,
        )
        .bind(researcher_id)
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        let mut goals = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.get("category");
            let target: i32 = row.get("target");
            match (raw.parse::<Category>(), u32::try_from(target)) {
                (Ok(category), Ok(target)) => goals.push(Goal { category, target }),
                _ => tracing::warn!(%researcher_id, category = %raw, goal_target = target, "skipping unusable goal row"),
            }
        }
        Ok(goals)
    }
}

async fn upsert_researcher(
    pool: &PgPool,
    id: Uuid,
    full_name: &str,
    email: &str,
    college: &str,
    department: &str,
    academic_title: &str,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO portal.researchers (id, full_name, email, college, department, academic_title)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name,
            college = EXCLUDED.college,
            department = EXCLUDED.department,
            academic_title = EXCLUDED.academic_title
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(full_name)
    .bind(email)
    .bind(college)
    .bind(department)
    .bind(academic_title)
    .fetch_one(pool)
    .await?
    .get("id");
    Ok(id)
}

/// Inserts one activity; returns whether a new row was written.
async fn insert_activity(
    pool: &PgPool,
    researcher_id: Uuid,
    category: Category,
    title: &str,
    occurred_on: NaiveDate,
    source_key: &str,
) -> anyhow::Result<bool> {
    let (table, column) = source(category);
    let query = format!(
        "INSERT INTO portal.{table} (id, researcher_id, title, {column}, source_key) \
         VALUES ($1, $2, $3, $4::date, $5) \
         ON CONFLICT (source_key) DO NOTHING"
    );
    let result = sqlx::query(&query)
        .bind(Uuid::new_v4())
        .bind(researcher_id)
        .bind(title)
        .bind(occurred_on)
        .bind(source_key)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let researchers = vec![
        (
            Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2")?,
            "Layla Haddad",
            "layla.haddad@university.edu",
            "Engineering",
            "Civil Engineering",
            "Professor",
        ),
        (
            Uuid::parse_str("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc")?,
            "Omar Saleh",
            "omar.saleh@university.edu",
            "Engineering",
            "Electrical Engineering",
            "Associate Professor",
        ),
        (
            Uuid::parse_str("d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2")?,
            "Nadia Karim",
            "nadia.karim@university.edu",
            "Science",
            "Chemistry",
            "Associate Professor",
        ),
    ];

    for (id, name, email, college, department, title) in researchers {
        upsert_researcher(pool, id, name, email, college, department, title).await?;
    }

    let activities = vec![
        ("seed-001", "layla.haddad@university.edu", Category::Research, "Bridge fatigue modelling", (2025, 3, 14)),
        ("seed-002", "layla.haddad@university.edu", Category::Research, "Seismic retrofit survey", (2024, 11, 2)),
        ("seed-003", "layla.haddad@university.edu", Category::Conferences, "Structures Congress", (2025, 5, 20)),
        ("seed-004", "layla.haddad@university.edu", Category::Committees, "Graduate studies committee", (2025, 1, 8)),
        ("seed-005", "omar.saleh@university.edu", Category::Research, "Grid storage scheduling", (2025, 2, 27)),
        ("seed-006", "omar.saleh@university.edu", Category::Courses, "Power systems short course", (2025, 4, 1)),
        ("seed-007", "omar.saleh@university.edu", Category::Workshops, "Embedded safety workshop", (2023, 9, 12)),
        ("seed-008", "nadia.karim@university.edu", Category::Research, "Catalyst degradation study", (2025, 6, 30)),
        ("seed-009", "nadia.karim@university.edu", Category::Reviewing, "Journal of Catalysis review", (2025, 7, 15)),
        ("seed-010", "nadia.karim@university.edu", Category::ThankYouLetters, "Outreach day thanks", (2024, 12, 5)),
    ];

    for (source_key, email, category, title, (year, month, day)) in activities {
        let researcher_id: Uuid = sqlx::query("SELECT id FROM portal.researchers WHERE email = $1")
            .bind(email)
            .fetch_one(pool)
            .await?
            .get("id");
        let occurred_on = NaiveDate::from_ymd_opt(year, month, day).context("invalid date")?;
        insert_activity(pool, researcher_id, category, title, occurred_on, source_key).await?;
    }

    sqlx::query(
        r#"
        INSERT INTO portal.goals (id, researcher_id, category, target, year)
        SELECT $1, id, 'research', 4, NULL FROM portal.researchers WHERE email = $2
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind("layla.haddad@university.edu")
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        college: String,
        department: String,
        academic_title: String,
        category: String,
        title: String,
        occurred_on: NaiveDate,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        let category: Category = row
            .category
            .parse()
            .with_context(|| format!("row {}: unsupported category", line + 1))?;
        let researcher_id = upsert_researcher(
            pool,
            Uuid::new_v4(),
            &row.full_name,
            &row.email,
            &row.college,
            &row.department,
            &row.academic_title,
        )
        .await?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        if insert_activity(pool, researcher_id, category, &row.title, row.occurred_on, &source_key)
            .await?
        {
            inserted += 1;
        }
    }

    tracing::info!(path = %csv_path.display(), inserted, "imported activities");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_a_distinct_dated_source() {
        let mut tables: Vec<&str> = Category::ALL.into_iter().map(|c| source(c).0).collect();
        tables.sort_unstable();
        tables.dedup();
        assert_eq!(tables.len(), Category::ALL.len());
        assert_eq!(source(Category::ThankYouLetters).1, "created_at");
        assert_eq!(source(Category::Committees).1, "assignment_date");
    }
}
