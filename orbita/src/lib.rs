//! Orbita federates satellite-imagery searches and drives chunked statistics
//! fetches across multiple providers.
//!
//! Overview
//! - Routes requests to connectors that implement the `orbita_core` contracts.
//! - Search: every allowed-month sub-range of a query is walked most recent
//!   first; within a sub-range the providers' pages are k-way merged by sensing
//!   time, so successive batches never skip or repeat a record.
//! - Statistics: a series is fetched backwards in bounded chunks, each chunk
//!   merged into a per-day accumulator before the next one is requested.
//! - Cancellation is cooperative via `tokio_util::sync::CancellationToken`;
//!   a cancelled operation never publishes partial output.
//!
//! Key behaviors and trade-offs
//! - Pages are fetched lazily: one buffered page per provider, a new page only
//!   when the buffer is drained. Batches stay cheap but a deep search costs one
//!   round-trip per page per provider.
//! - A provider that fails mid-search produces a warning and is dropped for the
//!   rest of the session; the remaining providers keep the merge going.
//! - A failed statistics chunk is not retried. Data already merged is kept.
//! - Compare layouts cap the primary channels per layer; a layer exceeding the
//!   cap is marked unavailable while its siblings still render.
//!
//! Examples
//! Searching two providers for summer scenes:
//! ```rust,ignore
//! use std::sync::Arc;
//! use orbita::{Orbita, Months, SearchQuery};
//! use tokio_util::sync::CancellationToken;
//!
//! let orbita = Orbita::builder()
//!     .with_connector(Arc::new(orbita_mock::MockConnector::new()))
//!     .page_size(25)
//!     .build()?;
//!
//! let query = SearchQuery::new(aoi, range).months(Months::JUNE | Months::JULY | Months::AUGUST);
//! let mut session = orbita.search(query, CancellationToken::new())?;
//! while session.has_more() {
//!     let report = session.next_n_results(50).await;
//!     // render report.response ...
//! }
//! ```
//!
//! Fetching a statistics series and exporting it:
//! ```rust,ignore
//! use orbita::{StatisticsQuery, OutputSelector};
//!
//! let query = StatisticsQuery::new(
//!     orbita_mock::MockConnector::KEY,
//!     aoi,
//!     OutputSelector { layer: "NDVI".into(), auxiliary: true },
//! );
//! let mut series = orbita.statistics(query)?;
//! let report = series.run(&CancellationToken::new()).await;
//! let csv = series.accumulator().to_csv_table().to_csv_string()?;
//! ```
//!
//! See `orbita/examples/` for runnable end-to-end demonstrations.
#![warn(missing_docs)]

pub(crate) mod core;
mod router;

pub use core::{Orbita, OrbitaBuilder, tag_err};
pub use router::search::{IntervalSession, ProviderCursor, SearchQuery, SearchSession};
pub use router::statistics::{
    Action, DISTRIBUTION_BINS, Event, MIXED_LAYER_COUNT, Phase, SeriesFetcher, SeriesMachine,
    StatisticsQuery,
};
pub use router::util::{collapse_errors, join_with_deadline};

// Re-export core types for convenience
pub use orbita_core::{
    // Foundational types
    BasicStats,
    Capability,
    ChannelSeries,
    // Derived output
    ChartPoint,
    CsvChannels,
    CsvRecord,
    CsvTable,
    CsvValue,
    DeriveOptions,
    DerivedChannel,
    DerivedSeries,
    DistributionBand,
    FindRecordsRequest,
    GENERIC_STATISTICS_MESSAGE,
    Geometry,
    Histogram,
    HistogramBin,
    ImageryConnector,
    IntervalLength,
    Months,
    OrbitaConfig,
    OrbitaError,
    OutputSelector,
    ProviderKey,
    Record,
    RecordPage,
    RenderMode,
    ResolutionLimits,
    ResponseStatus,
    // Reports
    SearchBatch,
    SearchProvider,
    SearchReport,
    SeriesReport,
    SeriesState,
    StatSample,
    StatisticsProvider,
    StatisticsRequest,
    StatisticsResponse,
    StatsAccumulator,
    TimeRange,
    error_message,
    failure_message,
    flatten,
    partition,
};
