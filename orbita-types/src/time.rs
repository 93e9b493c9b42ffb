//! Time windows, month filters and the enumerated interval lengths.

use bitflags::bitflags;
use chrono::{DateTime, Datelike, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::OrbitaError;

/// Half-open time window `[start, end)` in UTC.
///
/// Construction validates `start <= end`; an equal pair is a valid empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange")]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawTimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = OrbitaError;

    fn try_from(raw: RawTimeRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl TimeRange {
    /// Build a validated window.
    ///
    /// # Errors
    /// Returns `InvalidArg` when `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, OrbitaError> {
        if start > end {
            return Err(OrbitaError::InvalidArg(format!(
                "time range starts after it ends: {start} > {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive upper bound.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Width of the window.
    #[must_use]
    pub fn span(&self) -> TimeDelta {
        self.end - self.start
    }

    /// True when `start == end`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Half-open membership test.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }

    /// Smallest window covering both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl core::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format("%Y-%m-%dT%H:%M:%SZ"),
            self.end.format("%Y-%m-%dT%H:%M:%SZ")
        )
    }
}

bitflags! {
    /// Set of calendar months a search is restricted to.
    ///
    /// Bit `i` is the month with zero-based index `i` (0 = January).
    /// [`Months::all()`] means no restriction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Months: u16 {
        /// January.
        const JANUARY = 1 << 0;
        /// February.
        const FEBRUARY = 1 << 1;
        /// March.
        const MARCH = 1 << 2;
        /// April.
        const APRIL = 1 << 3;
        /// May.
        const MAY = 1 << 4;
        /// June.
        const JUNE = 1 << 5;
        /// July.
        const JULY = 1 << 6;
        /// August.
        const AUGUST = 1 << 7;
        /// September.
        const SEPTEMBER = 1 << 8;
        /// October.
        const OCTOBER = 1 << 9;
        /// November.
        const NOVEMBER = 1 << 10;
        /// December.
        const DECEMBER = 1 << 11;
    }
}

impl Default for Months {
    fn default() -> Self {
        Self::all()
    }
}

impl Months {
    /// Build a filter from zero-based month indices (0 = January).
    ///
    /// # Errors
    /// Returns `InvalidArg` for an index above 11.
    pub fn from_indices<I>(indices: I) -> Result<Self, OrbitaError>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut out = Self::empty();
        for i in indices {
            if i > 11 {
                return Err(OrbitaError::InvalidArg(format!(
                    "month index out of range: {i}"
                )));
            }
            out |= Self::from_bits_retain(1 << i);
        }
        Ok(out)
    }

    /// Whether the month with zero-based index `month0` is allowed.
    #[must_use]
    pub fn allows_month0(self, month0: u32) -> bool {
        month0 < 12 && self.contains(Self::from_bits_retain(1 << month0))
    }

    /// Whether the month containing `ts` is allowed.
    #[must_use]
    pub fn allows(self, ts: DateTime<Utc>) -> bool {
        self.allows_month0(ts.month0())
    }
}

/// Statistics interval lengths offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum IntervalLength {
    /// One month.
    M1,
    /// Three months.
    M3,
    /// Six months.
    M6,
    /// One year.
    #[default]
    Y1,
    /// Two years.
    Y2,
    /// Five years.
    Y5,
}

impl IntervalLength {
    /// Number of calendar months the interval spans.
    #[must_use]
    pub const fn months(self) -> u32 {
        match self {
            Self::M1 => 1,
            Self::M3 => 3,
            Self::M6 => 6,
            Self::Y1 => 12,
            Self::Y2 => 24,
            Self::Y5 => 60,
        }
    }

    /// The window of this length ending at `end`.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the start would fall outside chrono's range.
    pub fn ending_at(self, end: DateTime<Utc>) -> Result<TimeRange, OrbitaError> {
        let start = end
            .checked_sub_months(chrono::Months::new(self.months()))
            .ok_or_else(|| OrbitaError::InvalidArg(format!("interval before {end} overflows")))?;
        TimeRange::new(start, end)
    }
}
