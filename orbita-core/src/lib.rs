//! orbita-core
//!
//! Core types, traits, and utilities shared across the orbita workspace.
//!
//! - `types`: common data structures (records, statistics, time ranges, config).
//! - `connector`: the `ImageryConnector` trait and capability provider traits.
//! - `payload`: readable messages from failed statistics responses.
//! - `timeseries`: month partitioning, statistics accumulation and CSV export.
//!
//! Nothing here performs I/O or depends on an async runtime; the traits are
//! `async_trait` so any executor can drive them, while the `orbita` crate
//! assumes Tokio.
#![warn(missing_docs)]

/// Connector capability traits and the primary `ImageryConnector` interface.
pub mod connector;
/// Error-body message extraction.
pub mod payload;
/// Time-series utilities for partitioning, accumulation and export.
pub mod timeseries;
pub mod types;

pub use connector::{
    CatalogHits, CatalogProvider, CatalogQuery, CatalogSearch, ImageryConnector, SearchProvider,
    StatisticsProvider,
};
pub use payload::{GENERIC_STATISTICS_MESSAGE, error_message, failure_message};
pub use timeseries::accumulate::StatsAccumulator;
pub use timeseries::csv::{CsvChannels, CsvRecord, CsvTable, CsvValue, flatten};
pub use timeseries::derive::{
    ChartPoint, DeriveOptions, DerivedChannel, DerivedSeries, DistributionBand, derive,
};
pub use timeseries::partition::partition;
pub use types::*;
