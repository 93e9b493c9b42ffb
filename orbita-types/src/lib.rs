//! orbita-specific data transfer objects and configuration primitives.
#![warn(missing_docs)]

mod capability;
mod config;
mod connector;
mod error;
mod record;
mod reports;
mod stats;
mod time;

pub use capability::Capability;
pub use config::{OrbitaConfig, RenderMode};
pub use connector::{ProviderKey, ResolutionLimits};
pub use error::OrbitaError;
pub use record::{FindRecordsRequest, Geometry, Record, RecordPage};
pub use reports::{SearchBatch, SearchReport, SeriesReport, SeriesState};
pub use stats::{
    BasicStats, ChannelSeries, Histogram, HistogramBin, OutputSelector, ResponseStatus,
    StatSample, StatisticsRequest, StatisticsResponse,
};
pub use time::{IntervalLength, Months, TimeRange};
