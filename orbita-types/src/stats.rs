//! Statistics request/response DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Geometry, TimeRange};

/// Per-day summary statistics of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasicStats {
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
    /// Mean value.
    pub mean: f64,
    /// Standard deviation.
    #[serde(rename = "stDev")]
    pub st_dev: f64,
}

impl BasicStats {
    /// True when min, max and mean are all finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.mean.is_finite()
    }
}

/// One histogram bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// Inclusive lower edge.
    #[serde(rename = "lowEdge")]
    pub low_edge: f64,
    /// Exclusive upper edge, when reported.
    #[serde(rename = "highEdge", default, skip_serializing_if = "Option::is_none")]
    pub high_edge: Option<f64>,
    /// Pixel count in the bin.
    #[serde(default)]
    pub count: f64,
}

/// Ordered histogram bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Histogram {
    /// Bins in ascending edge order.
    pub bins: Vec<HistogramBin>,
}

/// One day of statistics for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSample {
    /// Day the sample aggregates.
    pub date: NaiveDate,
    /// Summary statistics.
    #[serde(rename = "basicStats")]
    pub basic: BasicStats,
    /// Optional value distribution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histogram: Option<Histogram>,
}

/// Samples of one named output channel, in response order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSeries {
    /// Channel identifier (band or index name).
    pub id: String,
    /// Per-day samples.
    pub samples: Vec<StatSample>,
}

impl ChannelSeries {
    /// Convenience constructor.
    pub fn new(id: impl Into<String>, samples: Vec<StatSample>) -> Self {
        Self {
            id: id.into(),
            samples,
        }
    }
}

/// Which outputs the statistics service should compute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSelector {
    /// Layer or evaluation script identifier.
    pub layer: String,
    /// Append the auxiliary (coverage/quality) channel after the primary ones.
    pub auxiliary: bool,
}

/// One bounded statistics request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRequest {
    /// Area to aggregate over.
    pub geometry: Geometry,
    /// Coordinate reference system identifier, e.g. `EPSG:4326`.
    pub crs: String,
    /// Window to aggregate; never wider than the configured chunk span.
    pub range: TimeRange,
    /// Meters per pixel.
    pub resolution: f64,
    /// Histogram bin count, if a distribution is wanted.
    pub bins: Option<u32>,
    /// Output selection.
    pub output: OutputSelector,
}

/// Service-level status carried by a statistics response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    /// Data is usable.
    Ok,
    /// The service answered but flagged the result; the message is informative only.
    Failed(String),
}

/// A statistics response: per-channel samples in output order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsResponse {
    /// Response status.
    pub status: ResponseStatus,
    /// Channels in output order; when requested the auxiliary channel is last.
    pub channels: Vec<ChannelSeries>,
}

impl StatisticsResponse {
    /// An OK response with the given channels.
    #[must_use]
    pub const fn ok(channels: Vec<ChannelSeries>) -> Self {
        Self {
            status: ResponseStatus::Ok,
            channels,
        }
    }
}
