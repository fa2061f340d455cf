//! crates/goals_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Goal, GoalCompletion, WeekSummary};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The goal already has as many completions this week as its target allows.
    /// Deliberate, user-facing; never retried.
    #[error("Goal {goal_id} already completed this week")]
    QuotaExceeded { goal_id: Uuid },
    #[error("Store error: {0}")]
    Store(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// Inserts a new goal with a server-generated id and creation timestamp.
    async fn create_goal(&self, title: &str, desired_weekly_frequency: i32) -> PortResult<Goal>;

    /// Logs one completion for `goal_id`, subject to the weekly quota.
    ///
    /// Fails with [`PortError::QuotaExceeded`] when the goal already has
    /// `desired_weekly_frequency` completions inside the current calendar
    /// week, and with [`PortError::NotFound`] when the goal does not exist.
    /// In both cases nothing is inserted.
    async fn create_goal_completion(&self, goal_id: Uuid) -> PortResult<GoalCompletion>;

    /// Aggregates the current calendar week into a [`WeekSummary`].
    ///
    /// A week with no goals and no completions yields
    /// `completed = 0, total = 0` and an empty `goals_per_day` map.
    async fn week_summary(&self) -> PortResult<WeekSummary>;
}
