//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use goals_core::ports::GoalRepository;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The repository is held behind the port trait rather than as a module-level
/// singleton, so handlers stay testable against any implementation.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn GoalRepository>,
    pub config: Arc<Config>,
}
