//! Per-tick simulation systems.

pub mod production;
pub mod victory;

pub use production::{run_production_tick, ProductionGrant};
pub use victory::evaluate_outcome;
