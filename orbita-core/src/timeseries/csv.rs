//! Flattening of per-channel time series into one CSV table.

use chrono::{DateTime, Utc};

use crate::OrbitaError;

/// One cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum CsvValue {
    /// Rendered as `YYYY-MM-DDTHH:MM:SS.sssZ`.
    Date(DateTime<Utc>),
    /// Rendered with `f64`'s shortest round-trip form.
    Number(f64),
    /// Rendered verbatim.
    Text(String),
    /// Missing value.
    Empty,
}

impl core::fmt::Display for CsvValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Empty => Ok(()),
        }
    }
}

/// A record: ordered `(field, value)` pairs.
pub type CsvRecord = Vec<(String, CsvValue)>;

/// Named channels of records, kept in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CsvChannels {
    entries: Vec<(String, Vec<CsvRecord>)>,
}

impl CsvChannels {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel, or replace the records of an existing one in place.
    pub fn insert(&mut self, name: impl Into<String>, records: Vec<CsvRecord>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = records,
            None => self.entries.push((name, records)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, records: Vec<CsvRecord>) -> Self {
        self.insert(name, records);
        self
    }

    /// Channels in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CsvRecord])> {
        self.entries.iter().map(|(n, r)| (n.as_str(), r.as_slice()))
    }
}

/// Header plus rows, ready for serialization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CsvTable {
    /// `<channel>/<field>` column names.
    pub header: Vec<String>,
    /// One entry per header column in every row.
    pub rows: Vec<Vec<CsvValue>>,
}

impl CsvTable {
    /// Serialize as CSV text: the header line then one line per row, each
    /// terminated by `\n`. An empty header renders as a lone `"\n"`.
    ///
    /// # Errors
    /// Returns `Data` if the writer fails.
    pub fn to_csv_string(&self) -> Result<String, OrbitaError> {
        if self.header.is_empty() {
            return Ok("\n".to_string());
        }
        let mut wtr = ::csv::WriterBuilder::new()
            .terminator(::csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        wtr.write_record(&self.header).map_err(csv_err)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(ToString::to_string))
                .map_err(csv_err)?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| OrbitaError::Data(format!("csv flush: {e}")))?;
        String::from_utf8(bytes).map_err(|e| OrbitaError::Data(format!("csv utf8: {e}")))
    }
}

#[allow(clippy::needless_pass_by_value)]
fn csv_err(e: ::csv::Error) -> OrbitaError {
    OrbitaError::Data(format!("csv write: {e}"))
}

/// Flatten `channels` into one table.
///
/// Each channel contributes the fields of its first record, minus `excluded`
/// (bare field names), as `<channel>/<field>` columns. Row `i` joins record
/// `i` of every channel; shorter channels leave their cells empty. A table
/// without columns has no rows.
#[must_use]
pub fn flatten(channels: &CsvChannels, excluded: &[&str]) -> CsvTable {
    let columns: Vec<(&str, &[CsvRecord], Vec<&str>)> = channels
        .iter()
        .map(|(name, records)| {
            let fields: Vec<&str> = records
                .first()
                .map(|first| {
                    first
                        .iter()
                        .map(|(k, _)| k.as_str())
                        .filter(|k| !excluded.contains(k))
                        .collect()
                })
                .unwrap_or_default();
            (name, records, fields)
        })
        .filter(|(_, _, fields)| !fields.is_empty())
        .collect();

    let header: Vec<String> = columns
        .iter()
        .flat_map(|(name, _, fields)| fields.iter().map(move |f| format!("{name}/{f}")))
        .collect();
    if header.is_empty() {
        return CsvTable::default();
    }

    let height = columns.iter().map(|(_, r, _)| r.len()).max().unwrap_or(0);
    let rows = (0..height)
        .map(|i| {
            columns
                .iter()
                .flat_map(|(_, records, fields)| {
                    let record = records.get(i);
                    fields.iter().map(move |f| {
                        record
                            .and_then(|r| r.iter().find(|(k, _)| k == f))
                            .map_or(CsvValue::Empty, |(_, v)| v.clone())
                    })
                })
                .collect()
        })
        .collect();

    CsvTable { header, rows }
}
