pub mod aggregator;
pub mod capacity;
pub mod classifier;
pub mod decimal;
pub mod eligibility;
pub mod engine;
pub mod health;
pub mod params;
