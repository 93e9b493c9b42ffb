use chrono::{Datelike, NaiveDate};
use orbita_core::{
    BasicStats, ChannelSeries, Histogram, HistogramBin, StatSample, StatisticsRequest,
    StatisticsResponse,
};

use super::scenes;

/// Synthetic vegetation index for a day: a seasonal wave peaking in summer.
pub fn vegetation(date: NaiveDate) -> BasicStats {
    let phase = f64::from(date.ordinal0()) / 365.0 * std::f64::consts::TAU;
    let mean = 0.25f64.mul_add(-(phase.cos()), 0.45);
    BasicStats {
        min: mean - 0.2,
        max: mean + 0.2,
        mean,
        st_dev: 0.08,
    }
}

/// Band reflectance for the multi-band layer.
pub fn reflectance(date: NaiveDate, band: u32) -> BasicStats {
    let mean = 0.01f64.mul_add(f64::from(band), 0.05 + f64::from(date.day()) / 1000.0);
    BasicStats {
        min: mean - 0.02,
        max: mean + 0.02,
        mean,
        st_dev: 0.01,
    }
}

/// Fraction of cloudy pixels, `0.0..1.0`.
pub fn cloud_fraction(date: NaiveDate) -> f64 {
    (f64::from(date.ordinal()) * 37.0).rem_euclid(100.0) / 100.0
}

/// `bins` equal-width bins spanning `stats`.
pub fn histogram(stats: &BasicStats, bins: u32) -> Histogram {
    let width = (stats.max - stats.min) / f64::from(bins.max(1));
    Histogram {
        bins: (0..bins)
            .map(|i| HistogramBin {
                low_edge: width.mul_add(f64::from(i), stats.min),
                high_edge: Some(width.mul_add(f64::from(i + 1), stats.min)),
                count: 1.0,
            })
            .collect(),
    }
}

fn sample(date: NaiveDate, basic: BasicStats, bins: Option<u32>) -> StatSample {
    StatSample {
        date,
        histogram: bins.map(|n| histogram(&basic, n)),
        basic,
    }
}

/// Days with an acquisition inside the request window, oldest first.
pub fn days(req: &StatisticsRequest) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = scenes::acquisitions(&req.range)
        .into_iter()
        .map(|t| t.date_naive())
        .collect();
    days.reverse();
    days
}

/// Response for the single-band vegetation layer.
pub fn vegetation_response(req: &StatisticsRequest) -> StatisticsResponse {
    let days = days(req);
    let mut channels = vec![ChannelSeries::new(
        req.output.layer.clone(),
        days.iter()
            .map(|d| sample(*d, vegetation(*d), req.bins))
            .collect(),
    )];
    if req.output.auxiliary {
        channels.push(auxiliary(&days));
    }
    StatisticsResponse::ok(channels)
}

/// Response for a layer rendering three reflectance bands.
pub fn multi_band_response(req: &StatisticsRequest) -> StatisticsResponse {
    let days = days(req);
    let mut channels: Vec<ChannelSeries> = ["B04", "B08", "B11"]
        .iter()
        .zip(1u32..)
        .map(|(id, band)| {
            ChannelSeries::new(
                *id,
                days.iter()
                    .map(|d| sample(*d, reflectance(*d, band), req.bins))
                    .collect(),
            )
        })
        .collect();
    if req.output.auxiliary {
        channels.push(auxiliary(&days));
    }
    StatisticsResponse::ok(channels)
}

fn auxiliary(days: &[NaiveDate]) -> ChannelSeries {
    ChannelSeries::new(
        "CLM",
        days.iter()
            .map(|d| {
                let f = cloud_fraction(*d);
                sample(
                    *d,
                    BasicStats {
                        min: 0.0,
                        max: 1.0,
                        mean: f,
                        st_dev: 0.0,
                    },
                    None,
                )
            })
            .collect(),
    )
}
