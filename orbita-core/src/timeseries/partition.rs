use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::{Months, TimeRange};

/// Split `range` into the sub-ranges that fall inside allowed months.
///
/// - `Months::all()` returns `[range]` unchanged.
/// - Otherwise calendar months (UTC) overlapping `range` are walked in order;
///   runs of consecutive allowed months merge into one sub-range, clipped to
///   `range` at both ends.
/// - The result is ascending and pairwise disjoint; reverse it for
///   most-recent-first processing.
/// - When no allowed month overlaps `range` (or `range` is empty) the result is
///   empty. That means "no results possible", not an error.
#[must_use]
pub fn partition(range: &TimeRange, months: Months) -> Vec<TimeRange> {
    if months.is_all() {
        return vec![*range];
    }
    let mut out: Vec<TimeRange> = Vec::new();
    if range.is_empty() || months.is_empty() {
        return out;
    }

    let mut open: Option<DateTime<Utc>> = None;
    let mut cursor = month_start(range.start());
    while let Some(month) = cursor
        && month < range.end()
    {
        if months.allows(month) {
            if open.is_none() {
                open = Some(month.max(range.start()));
            }
        } else if let Some(start) = open.take()
            && let Ok(piece) = TimeRange::new(start, month)
        {
            out.push(piece);
        }
        cursor = next_month_start(month);
    }
    if let Some(start) = open
        && let Ok(piece) = TimeRange::new(start, range.end())
    {
        out.push(piece);
    }
    out
}

fn month_start(ts: DateTime<Utc>) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(ts.year(), ts.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
}

fn next_month_start(month: DateTime<Utc>) -> Option<DateTime<Utc>> {
    month.checked_add_months(chrono::Months::new(1))
}
