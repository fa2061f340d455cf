pub mod rest;
pub mod state;

// Re-export the handlers to make them easily accessible to the binary
// that builds the web server router.
pub use rest::{
    create_goal_completion_handler, create_goal_handler, get_week_summary_handler, health_handler,
};
