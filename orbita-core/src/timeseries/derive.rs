use chrono::NaiveDate;
use serde::Serialize;

use super::accumulate::StatsAccumulator;
use crate::{Histogram, StatSample};

/// Options applied when turning accumulated samples into chart series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeriveOptions {
    /// Drop samples whose auxiliary value (percent, `0..=100`) exceeds this.
    pub max_auxiliary_value: Option<f64>,
    /// Emit distribution bands from 10-bin histograms.
    pub distribution: bool,
    /// Decimal places kept in value ranges.
    pub precision: u32,
}

impl Default for DeriveOptions {
    fn default() -> Self {
        Self {
            max_auxiliary_value: None,
            distribution: false,
            precision: 2,
        }
    }
}

/// Percentile band read from a 10-bin histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistributionBand {
    /// 10th percentile.
    pub p10: f64,
    /// Median.
    pub median: f64,
    /// 90th percentile.
    pub p90: f64,
}

/// One plotted day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Sample day.
    pub date: NaiveDate,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
    /// Mean value.
    pub mean: f64,
    /// Standard deviation.
    pub st_dev: f64,
    /// Same-day auxiliary value in percent.
    pub auxiliary: Option<f64>,
    /// Distribution band, when requested and available.
    pub band: Option<DistributionBand>,
}

/// Kept points of one primary channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedChannel {
    /// Channel id.
    pub id: String,
    /// Points in ascending date order.
    pub points: Vec<ChartPoint>,
    /// `(min of mins, max of maxes)` over kept points; `None` when none kept.
    pub value_range: Option<(f64, f64)>,
}

/// Chart-ready view of an accumulator.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct DerivedSeries {
    /// Primary channels in first-seen order.
    pub channels: Vec<DerivedChannel>,
}

/// Derive chart series from `acc`.
///
/// Per primary channel:
/// - samples with a non-finite min, max or mean are dropped;
/// - with `max_auxiliary_value` set, samples whose same-day auxiliary value
///   exceeds it are dropped (days without an auxiliary sample are kept);
/// - the value range spans the kept samples, rounded to `precision`;
/// - with `distribution`, a sample carrying exactly 10 bins gets a band.
///
/// Same accumulator and options always give the same output.
#[must_use]
pub fn derive(acc: &StatsAccumulator, opts: &DeriveOptions) -> DerivedSeries {
    let channels = acc
        .primary_channels()
        .map(|(id, samples)| {
            let points: Vec<ChartPoint> = samples
                .values()
                .filter(|s| s.basic.is_finite())
                .filter_map(|s| {
                    let auxiliary = acc
                        .auxiliary_on(s.date)
                        .map(|a| a.basic.mean * 100.0)
                        .filter(|v| v.is_finite());
                    if let (Some(limit), Some(v)) = (opts.max_auxiliary_value, auxiliary)
                        && v > limit
                    {
                        return None;
                    }
                    Some(point(s, auxiliary, opts.distribution))
                })
                .collect();
            let value_range = points
                .iter()
                .map(|p| (p.min, p.max))
                .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
                .map(|(lo, hi)| (round_to(lo, opts.precision), round_to(hi, opts.precision)));
            DerivedChannel {
                id: id.to_string(),
                points,
                value_range,
            }
        })
        .collect();
    DerivedSeries { channels }
}

impl StatsAccumulator {
    /// Shorthand for [`derive`].
    #[must_use]
    pub fn derive(&self, opts: &DeriveOptions) -> DerivedSeries {
        derive(self, opts)
    }
}

fn point(s: &StatSample, auxiliary: Option<f64>, distribution: bool) -> ChartPoint {
    ChartPoint {
        date: s.date,
        min: s.basic.min,
        max: s.basic.max,
        mean: s.basic.mean,
        st_dev: s.basic.st_dev,
        auxiliary,
        band: if distribution {
            s.histogram.as_ref().and_then(band)
        } else {
            None
        },
    }
}

fn band(h: &Histogram) -> Option<DistributionBand> {
    if h.bins.len() != 10 {
        return None;
    }
    Some(DistributionBand {
        p10: h.bins[1].low_edge,
        median: h.bins[5].low_edge,
        p90: h.bins[9].low_edge,
    })
}

fn round_to(v: f64, precision: u32) -> f64 {
    let exp = i32::try_from(precision.min(12)).unwrap_or(12);
    let factor = 10f64.powi(exp);
    (v * factor).round() / factor
}
