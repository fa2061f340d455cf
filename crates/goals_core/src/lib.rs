pub mod domain;
pub mod ports;
pub mod week;

pub use domain::{DayCompletion, Goal, GoalCompletion, WeekSummary};
pub use ports::{GoalRepository, PortError, PortResult};
pub use week::WeekWindow;
