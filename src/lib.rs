pub mod components;
pub mod config;
pub mod ecs;
pub mod scenario;
pub mod scheduler;
pub mod systems;

pub use config::{LoggingConfig, WorldConfig};
pub use ecs::{Commands, Entity, EcsError, Query, QuerySpec, System, World};
pub use scenario::{Scenario, ScenarioLoader};
pub use scheduler::{RunReport, Scheduler};
