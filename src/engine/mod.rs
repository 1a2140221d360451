//! Core engine: repository → estimator → aggregator → optimizer.

pub mod planner;

pub use planner::Planner;
