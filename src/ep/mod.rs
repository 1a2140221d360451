//! Expected-points engine: per-gameweek estimation and horizon aggregation.

pub mod aggregator;
pub mod estimator;

pub use aggregator::EpAggregator;
pub use estimator::{EpBreakdown, EpEstimator, EstimatorConfig, PositionPoints};
