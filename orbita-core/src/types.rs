//! Re-export of foundational types from `orbita-types`.
// Consolidated re-exports so downstream crates can depend on `orbita-core` only

pub use orbita_types::{Capability, OrbitaError, ProviderKey, ResolutionLimits};

pub use orbita_types::{IntervalLength, Months, OrbitaConfig, RenderMode, TimeRange};

pub use orbita_types::{FindRecordsRequest, Geometry, Record, RecordPage};

pub use orbita_types::{
    BasicStats, ChannelSeries, Histogram, HistogramBin, OutputSelector, ResponseStatus,
    StatSample, StatisticsRequest, StatisticsResponse,
};

pub use orbita_types::{SearchBatch, SearchReport, SeriesReport, SeriesState};
