//! Search-side records and the geometry they cover.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ProviderKey, TimeRange};

/// Area of interest or tile footprint in WGS84 longitude/latitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    /// Axis-aligned bounding box.
    BBox {
        /// Western edge.
        min_lon: f64,
        /// Southern edge.
        min_lat: f64,
        /// Eastern edge.
        max_lon: f64,
        /// Northern edge.
        max_lat: f64,
    },
    /// Single point, e.g. a pixel picked on the map.
    Point {
        /// Longitude.
        lon: f64,
        /// Latitude.
        lat: f64,
    },
    /// Closed outer ring.
    Polygon {
        /// Ring vertices as `[lon, lat]`.
        ring: Vec<[f64; 2]>,
    },
}

impl Geometry {
    /// Bounding box `[min_lon, min_lat, max_lon, max_lat]` of the geometry.
    #[must_use]
    pub fn bounds(&self) -> [f64; 4] {
        match self {
            Self::BBox {
                min_lon,
                min_lat,
                max_lon,
                max_lat,
            } => [*min_lon, *min_lat, *max_lon, *max_lat],
            Self::Point { lon, lat } => [*lon, *lat, *lon, *lat],
            Self::Polygon { ring } => ring.iter().fold(
                [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY],
                |[a, b, c, d], [x, y]| [a.min(*x), b.min(*y), c.max(*x), d.max(*y)],
            ),
        }
    }
}

/// One tile/scene search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Provider that produced the record.
    pub provider: ProviderKey,
    /// Provider-scoped identifier.
    pub id: String,
    /// Acquisition time; the federation ordering key.
    pub sensing_time: DateTime<Utc>,
    /// Tile footprint.
    pub geometry: Geometry,
    /// Provider-specific extras (cloud cover, orbit, ...).
    pub metadata: serde_json::Value,
}

/// One page request issued to a paginated search provider.
#[derive(Debug, Clone, PartialEq)]
pub struct FindRecordsRequest {
    /// Area to search.
    pub geometry: Geometry,
    /// Window to search.
    pub range: TimeRange,
    /// Page size.
    pub max_count: usize,
    /// Records already consumed from this window.
    pub offset: usize,
}

/// One page of provider search results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordPage {
    /// Records on this page.
    pub records: Vec<Record>,
    /// Whether another page exists after this one.
    pub has_more: bool,
    /// Provider hits dropped while building `records`; they still count
    /// toward the next page's offset.
    pub skipped: usize,
}
