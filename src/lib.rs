//! SQUADSMITH: expected-points engine and constrained squad optimizer
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod data;
pub mod ep;
pub mod storage;
pub mod optimizer;
pub mod engine;
