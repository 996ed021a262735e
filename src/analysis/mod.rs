//! Valuation pipeline: fan-out, failure substitution, weighting and
//! aggregation into the final report.

pub mod aggregator;
pub mod orchestrator;
pub mod runner;
pub mod substitute;
pub mod weights;

pub use orchestrator::Orchestrator;
pub use weights::WeightTable;
