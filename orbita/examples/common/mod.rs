use orbita::{Geometry, ImageryConnector, TimeRange};
use std::sync::Arc;

#[must_use]
pub fn get_connector() -> Arc<dyn ImageryConnector> {
    Arc::new(orbita_mock::MockConnector::new())
}

/// Fields around Ljubljana.
#[must_use]
pub fn area_of_interest() -> Geometry {
    Geometry::BBox {
        min_lon: 14.45,
        min_lat: 46.02,
        max_lon: 14.55,
        max_lat: 46.08,
    }
}

pub fn last_years(years: i32) -> Result<TimeRange, orbita::OrbitaError> {
    let end = chrono::Utc::now();
    let start = end
        .checked_sub_months(chrono::Months::new(12 * years.unsigned_abs()))
        .unwrap_or(end);
    TimeRange::new(start, end)
}
