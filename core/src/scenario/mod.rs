//! Scenario JSON documents: reading flight plans and rewriting old files.

pub mod config;
pub mod migrate;

pub use config::{flight_plan_model, FlightPlan, ScenarioConfig};
pub use migrate::{migrate_battery, migrate_remote};
