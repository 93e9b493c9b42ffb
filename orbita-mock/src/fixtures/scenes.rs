use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use orbita_core::{FindRecordsRequest, Geometry, ProviderKey, Record, RecordPage, TimeRange};
use serde_json::json;

/// Days between two acquisitions of the same tile.
pub const REVISIT_DAYS: i64 = 5;

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2015, 6, 27, 10, 30, 0)
        .single()
        .unwrap_or_default()
}

/// Acquisition times inside `range`, newest first.
pub fn acquisitions(range: &TimeRange) -> Vec<DateTime<Utc>> {
    let revisit = TimeDelta::days(REVISIT_DAYS);
    let first = if range.start() <= epoch() {
        epoch()
    } else {
        let elapsed = (range.start() - epoch()).num_seconds();
        let step = revisit.num_seconds();
        epoch() + TimeDelta::seconds(elapsed.div_euclid(step) * step)
    };
    let mut out = Vec::new();
    let mut t = first;
    while t < range.end() {
        if range.contains(t) {
            out.push(t);
        }
        t += revisit;
    }
    out.reverse();
    out
}

/// Cloud cover in percent for a scene, stable per acquisition.
pub fn cloud_cover(ts: DateTime<Utc>) -> f64 {
    let day = ts.timestamp().div_euclid(86_400);
    #[allow(clippy::cast_precision_loss)]
    let pct = day.wrapping_mul(37).rem_euclid(100) as f64;
    pct
}

fn record(provider: ProviderKey, ts: DateTime<Utc>, geometry: &Geometry) -> Record {
    Record {
        provider,
        id: format!("{}_{}", provider.as_str().to_uppercase(), ts.format("%Y%m%dT%H%M%S")),
        sensing_time: ts,
        geometry: geometry.clone(),
        metadata: json!({ "cloudCover": cloud_cover(ts) }),
    }
}

/// One page of synthetic records for `req`.
pub fn page(provider: ProviderKey, req: &FindRecordsRequest) -> RecordPage {
    let all = acquisitions(&req.range);
    let records: Vec<Record> = all
        .iter()
        .skip(req.offset)
        .take(req.max_count)
        .map(|ts| record(provider, *ts, &req.geometry))
        .collect();
    RecordPage {
        has_more: req.offset + records.len() < all.len(),
        records,
        skipped: 0,
    }
}
