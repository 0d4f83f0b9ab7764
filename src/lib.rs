pub mod config;
pub mod dispatch;
pub mod error;
pub mod evolve;
pub mod growth;
pub mod rng;
pub mod states;

pub use config::Scenario;
pub use dispatch::{Planner, PlannerSettings};
pub use error::{PlanError, ScenarioError};
