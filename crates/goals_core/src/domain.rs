//! crates/goals_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A tracked habit with a weekly completion target.
#[derive(Debug, Clone)]
pub struct Goal {
    pub id: Uuid,
    pub title: String,
    /// Number of completions expected per calendar week. Always positive.
    pub desired_weekly_frequency: i32,
    pub created_at: DateTime<Utc>,
}

/// A single logged instance of performing a goal's activity.
#[derive(Debug, Clone)]
pub struct GoalCompletion {
    pub id: Uuid,
    pub goal_id: Uuid,
    /// Sole time dimension for weekly bucketing.
    pub created_at: DateTime<Utc>,
}

/// One completion as it appears inside a summary's day bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct DayCompletion {
    pub id: Uuid,
    pub title: String,
    pub completed_at: DateTime<Utc>,
}

/// Aggregate report of completions vs. targets for the current calendar week.
#[derive(Debug, Clone)]
pub struct WeekSummary {
    /// Total completions logged inside the week, across all goals.
    pub completed: i64,
    /// Sum of `desired_weekly_frequency` over goals that existed by week's end.
    pub total: i64,
    /// Completions bucketed by calendar day; days without completions are absent.
    pub goals_per_day: BTreeMap<NaiveDate, Vec<DayCompletion>>,
}
