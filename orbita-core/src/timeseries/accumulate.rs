use std::collections::{BTreeMap, btree_map::Entry};

use chrono::NaiveDate;

use super::csv::{CsvChannels, CsvRecord, CsvTable, CsvValue, flatten};
use crate::{ChannelSeries, StatSample, TimeRange};

/// Per-channel day samples collected across statistics chunks.
///
/// - Primary channels keep the order they were first seen in.
/// - Samples are keyed by date; the first sample for a date wins, so merging
///   the same chunk twice changes nothing.
/// - `covered` only ever grows; chunks are fetched backwards in time so in
///   practice its start moves earlier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsAccumulator {
    primary: Vec<(String, BTreeMap<NaiveDate, StatSample>)>,
    auxiliary: Option<(String, BTreeMap<NaiveDate, StatSample>)>,
    covered: Option<TimeRange>,
}

impl StatsAccumulator {
    /// Empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the channels of one chunk.
    ///
    /// With `auxiliary_present` and more than one channel, the last channel is
    /// the auxiliary (coverage/quality) channel. Returns the number of samples
    /// that were new.
    pub fn merge(&mut self, channels: Vec<ChannelSeries>, auxiliary_present: bool) -> usize {
        let mut channels = channels;
        let aux = if auxiliary_present && channels.len() > 1 {
            channels.pop()
        } else {
            None
        };

        let mut inserted = 0;
        for ch in channels {
            let idx = match self.primary.iter().position(|(id, _)| *id == ch.id) {
                Some(i) => i,
                None => {
                    self.primary.push((ch.id, BTreeMap::new()));
                    self.primary.len() - 1
                }
            };
            inserted += insert_first_wins(&mut self.primary[idx].1, ch.samples);
        }
        if let Some(ch) = aux {
            let (_, map) = self
                .auxiliary
                .get_or_insert_with(|| (ch.id, BTreeMap::new()));
            inserted += insert_first_wins(map, ch.samples);
        }
        inserted
    }

    /// Extend the covered window by a merged chunk's window.
    pub fn record_coverage(&mut self, window: TimeRange) {
        self.covered = Some(match self.covered {
            Some(c) => c.union(&window),
            None => window,
        });
    }

    /// Window merged so far, if any chunk was merged.
    #[must_use]
    pub const fn covered(&self) -> Option<TimeRange> {
        self.covered
    }

    /// Primary channel ids in first-seen order.
    pub fn channel_ids(&self) -> impl Iterator<Item = &str> {
        self.primary.iter().map(|(id, _)| id.as_str())
    }

    /// Number of primary channels.
    #[must_use]
    pub fn primary_count(&self) -> usize {
        self.primary.len()
    }

    /// Samples of one primary channel in ascending date order.
    #[must_use]
    pub fn channel(&self, id: &str) -> Option<Vec<&StatSample>> {
        self.primary
            .iter()
            .find(|(cid, _)| cid == id)
            .map(|(_, m)| m.values().collect())
    }

    pub(crate) fn primary_channels(
        &self,
    ) -> impl Iterator<Item = (&str, &BTreeMap<NaiveDate, StatSample>)> {
        self.primary.iter().map(|(id, m)| (id.as_str(), m))
    }

    /// Auxiliary sample for a date, if the auxiliary channel was present.
    #[must_use]
    pub fn auxiliary_on(&self, date: NaiveDate) -> Option<&StatSample> {
        self.auxiliary.as_ref().and_then(|(_, m)| m.get(&date))
    }

    /// True when nothing has been merged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primary.iter().all(|(_, m)| m.is_empty())
            && self.auxiliary.as_ref().is_none_or(|(_, m)| m.is_empty())
    }

    /// All channels (auxiliary last) as a CSV table with
    /// `date,min,max,mean,stDev` columns per channel.
    #[must_use]
    pub fn to_csv_table(&self) -> CsvTable {
        let mut channels = CsvChannels::new();
        for (id, map) in self.primary.iter().chain(self.auxiliary.iter()) {
            channels.insert(id.clone(), map.values().map(sample_record).collect());
        }
        flatten(&channels, &[])
    }
}

fn insert_first_wins(map: &mut BTreeMap<NaiveDate, StatSample>, samples: Vec<StatSample>) -> usize {
    let mut inserted = 0;
    for s in samples {
        match map.entry(s.date) {
            Entry::Vacant(v) => {
                v.insert(s);
                inserted += 1;
            }
            Entry::Occupied(_) => {}
        }
    }
    inserted
}

fn sample_record(s: &StatSample) -> CsvRecord {
    let date = s
        .date
        .and_hms_opt(0, 0, 0)
        .map_or(CsvValue::Empty, |d| CsvValue::Date(d.and_utc()));
    vec![
        ("date".to_string(), date),
        ("min".to_string(), CsvValue::Number(s.basic.min)),
        ("max".to_string(), CsvValue::Number(s.basic.max)),
        ("mean".to_string(), CsvValue::Number(s.basic.mean)),
        ("stDev".to_string(), CsvValue::Number(s.basic.st_dev)),
    ]
}
