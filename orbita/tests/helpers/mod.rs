
pub use mock_connector::MockConnector;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use orbita_core::{
    BasicStats, ChannelSeries, Geometry, OutputSelector, ProviderKey, Record, StatSample,
    StatisticsRequest, StatisticsResponse, TimeRange,
};

// ---------- Lightweight fixtures and helpers for tests ----------

/// Layer name used by most statistics tests.
pub const NDVI: &str = "NDVI";
/// Auxiliary channel name used by statistics fixtures.
pub const CLOUD: &str = "CLM";

/// Construct a UTC `DateTime` at 10:00 for readability in tests.
pub fn dt(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
}

/// Midnight-aligned UTC instant.
pub fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// Validated window.
pub fn range(from: DateTime<Utc>, to: DateTime<Utc>) -> TimeRange {
    TimeRange::new(from, to).unwrap()
}

/// Small area of interest.
pub fn aoi() -> Geometry {
    Geometry::BBox {
        min_lon: 14.45,
        min_lat: 46.02,
        max_lon: 14.55,
        max_lat: 46.08,
    }
}

/// A record from `provider` sensed at `ts`.
pub fn rec(provider: &'static str, ts: DateTime<Utc>) -> Record {
    Record {
        provider: ProviderKey::new(provider),
        id: format!("{provider}@{}", ts.timestamp()),
        sensing_time: ts,
        geometry: aoi(),
        metadata: serde_json::Value::Null,
    }
}

/// Single-layer output selection, optionally with the auxiliary channel.
pub fn output(layer: &str, auxiliary: bool) -> OutputSelector {
    OutputSelector {
        layer: layer.to_string(),
        auxiliary,
    }
}

/// A sample with the given range and midpoint mean.
pub fn sample(date: NaiveDate, min: f64, max: f64) -> StatSample {
    StatSample {
        date,
        basic: BasicStats {
            min,
            max,
            mean: (min + max) / 2.0,
            st_dev: 0.0,
        },
        histogram: None,
    }
}

/// One sample per day of the requested chunk for the request's layer, with a
/// cloud channel appended when the request asks for it.
pub fn daily_response(req: &StatisticsRequest) -> StatisticsResponse {
    let from = req.range.start().date_naive();
    let to = req.range.end().date_naive();
    let days: Vec<NaiveDate> = from.iter_days().take_while(|d| *d < to).collect();
    let mut channels = vec![ChannelSeries::new(
        req.output.layer.clone(),
        days.iter().map(|d| sample(*d, 0.1, 0.5)).collect(),
    )];
    if req.output.auxiliary {
        channels.push(ChannelSeries::new(
            CLOUD,
            days.iter().map(|d| sample(*d, 0.2, 0.2)).collect(),
        ));
    }
    StatisticsResponse::ok(channels)
}
