//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `GoalRepository` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use goals_core::domain::{DayCompletion, Goal, GoalCompletion, WeekSummary};
use goals_core::ports::{GoalRepository, PortError, PortResult};
use goals_core::week::WeekWindow;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `GoalRepository` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct GoalRecord {
    id: Uuid,
    title: String,
    desired_weekly_frequency: i32,
    created_at: DateTime<Utc>,
}
impl GoalRecord {
    fn to_domain(self) -> Goal {
        Goal {
            id: self.id,
            title: self.title,
            desired_weekly_frequency: self.desired_weekly_frequency,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct GoalCompletionRecord {
    id: Uuid,
    goal_id: Uuid,
    created_at: DateTime<Utc>,
}
impl GoalCompletionRecord {
    fn to_domain(self) -> GoalCompletion {
        GoalCompletion {
            id: self.id,
            goal_id: self.goal_id,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct WeekSummaryRecord {
    completed: i64,
    total: i64,
    goals_per_day: serde_json::Value,
}

/// Shape of one element inside the `JSON_AGG` day buckets.
#[derive(Deserialize)]
struct DayCompletionRow {
    id: Uuid,
    title: String,
    completed_at: DateTime<Utc>,
}

/// Decodes the `JSON_OBJECT_AGG` column into the domain's per-day map.
/// The query coalesces the aggregate to `{}`, so an empty week decodes
/// to an empty map rather than failing on null.
fn goals_per_day_from_json(
    value: serde_json::Value,
) -> Result<BTreeMap<NaiveDate, Vec<DayCompletion>>, serde_json::Error> {
    let rows: BTreeMap<NaiveDate, Vec<DayCompletionRow>> = serde_json::from_value(value)?;
    Ok(rows
        .into_iter()
        .map(|(date, completions)| {
            let completions = completions
                .into_iter()
                .map(|row| DayCompletion {
                    id: row.id,
                    title: row.title,
                    completed_at: row.completed_at,
                })
                .collect();
            (date, completions)
        })
        .collect())
}

//=========================================================================================
// SQL
//=========================================================================================

const INSERT_GOAL: &str = "\
INSERT INTO goals (id, title, desired_weekly_frequency)
VALUES ($1, $2, $3)
RETURNING id, title, desired_weekly_frequency, created_at";

/// Atomic guarded insert: the completion row is only written when the goal's
/// completion count inside the week window is still below its weekly target.
/// Counting and inserting in one statement closes the check-then-insert race
/// a separate SELECT would leave open.
const INSERT_GOAL_COMPLETION_GUARDED: &str = "\
WITH goal_completion_counts AS (
    SELECT goal_id, COUNT(id) AS completion_count
    FROM goal_completions
    WHERE goal_id = $1
      AND created_at >= $2
      AND created_at <= $3
    GROUP BY goal_id
)
INSERT INTO goal_completions (id, goal_id)
SELECT $4, goals.id
FROM goals
LEFT JOIN goal_completion_counts ON goal_completion_counts.goal_id = goals.id
WHERE goals.id = $1
  AND COALESCE(goal_completion_counts.completion_count, 0) < goals.desired_weekly_frequency
RETURNING id, goal_id, created_at";

const SELECT_GOAL_EXISTS: &str = "SELECT id FROM goals WHERE id = $1";

/// The weekly report as one round trip: three named intermediate result sets
/// (goals existing by week's end, completions inside the week joined to their
/// goal's title, completions grouped into per-day JSON buckets), then scalar
/// subqueries for the two totals and a coalesced object aggregate for the map.
const SELECT_WEEK_SUMMARY: &str = "\
WITH goals_created_up_to_week AS (
    SELECT id, title, desired_weekly_frequency, created_at
    FROM goals
    WHERE created_at <= $2
),
goals_completed_in_week AS (
    SELECT goal_completions.id,
           goals.title,
           goal_completions.created_at AS completed_at,
           DATE(goal_completions.created_at) AS completed_at_date
    FROM goal_completions
    INNER JOIN goals ON goals.id = goal_completions.goal_id
    WHERE goal_completions.created_at >= $1
      AND goal_completions.created_at <= $2
),
goals_completed_by_week_day AS (
    SELECT completed_at_date,
           JSON_AGG(
               JSON_BUILD_OBJECT(
                   'id', id,
                   'title', title,
                   'completed_at', completed_at
               )
               ORDER BY completed_at DESC
           ) AS completions
    FROM goals_completed_in_week
    GROUP BY completed_at_date
)
SELECT
    (SELECT COUNT(*) FROM goals_completed_in_week) AS completed,
    (SELECT COALESCE(SUM(desired_weekly_frequency), 0)::bigint
     FROM goals_created_up_to_week) AS total,
    COALESCE(
        JSON_OBJECT_AGG(completed_at_date, completions ORDER BY completed_at_date DESC),
        '{}'::json
    ) AS goals_per_day
FROM goals_completed_by_week_day";

//=========================================================================================
// `GoalRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl GoalRepository for DbAdapter {
    async fn create_goal(&self, title: &str, desired_weekly_frequency: i32) -> PortResult<Goal> {
        let record = sqlx::query_as::<_, GoalRecord>(INSERT_GOAL)
            .bind(Uuid::new_v4())
            .bind(title)
            .bind(desired_weekly_frequency)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Store(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn create_goal_completion(&self, goal_id: Uuid) -> PortResult<GoalCompletion> {
        let window = WeekWindow::containing(Utc::now());

        let inserted =
            sqlx::query_as::<_, GoalCompletionRecord>(INSERT_GOAL_COMPLETION_GUARDED)
                .bind(goal_id)
                .bind(window.first)
                .bind(window.last)
                .bind(Uuid::new_v4())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PortError::Store(e.to_string()))?;

        match inserted {
            Some(record) => Ok(record.to_domain()),
            // No row means the guard rejected the insert: either the goal is
            // unknown or its weekly quota is already met. One lookup tells
            // the two apart.
            None => {
                let exists = sqlx::query_scalar::<_, Uuid>(SELECT_GOAL_EXISTS)
                    .bind(goal_id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| PortError::Store(e.to_string()))?;
                match exists {
                    Some(_) => Err(PortError::QuotaExceeded { goal_id }),
                    None => Err(PortError::NotFound(format!("Goal {} not found", goal_id))),
                }
            }
        }
    }

    async fn week_summary(&self) -> PortResult<WeekSummary> {
        let window = WeekWindow::containing(Utc::now());

        let record = sqlx::query_as::<_, WeekSummaryRecord>(SELECT_WEEK_SUMMARY)
            .bind(window.first)
            .bind(window.last)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Store(e.to_string()))?;

        let goals_per_day = goals_per_day_from_json(record.goals_per_day)
            .map_err(|e| PortError::Store(format!("Malformed goals_per_day column: {}", e)))?;

        Ok(WeekSummary {
            completed: record.completed,
            total: record.total,
            goals_per_day,
        })
    }
}

//=========================================================================================
// Unit Tests
//=========================================================================================
