//! Time-series utilities shared by connectors and the orchestrator.
//!
//! Modules include:
//! - `partition`: split a time range by an allowed-months filter
//! - `accumulate`: merge statistics chunks into per-channel day samples
//! - `derive`: chart-ready series from accumulated samples
//! - `csv`: flatten per-channel records into one CSV table
/// Statistics chunk accumulation.
pub mod accumulate;
/// Flattening of channel records into CSV.
pub mod csv;
/// Chart series derivation.
pub mod derive;
/// Month-filter partitioning of time ranges.
pub mod partition;
