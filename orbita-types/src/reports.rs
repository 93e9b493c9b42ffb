//! Report envelopes produced by the orchestrator.

use serde::Serialize;

use crate::connector::ProviderKey;
use crate::error::OrbitaError;
use crate::record::Record;
use crate::time::TimeRange;

/// One batch of federated search results.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct SearchBatch {
    /// Records, most recent first.
    pub results: Vec<Record>,
    /// Whether a later call may still yield records.
    pub has_more: bool,
}

/// Summary of one `next_n_results` call.
///
/// `response` is `None` when the owning session was cancelled; anything in
/// flight at that moment is discarded. `warnings` lists provider failures
/// tagged with the provider name; each failing provider is dropped from the
/// rest of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct SearchReport {
    /// Batch payload.
    pub response: Option<SearchBatch>,
    /// Non-fatal issues encountered while building the report.
    pub warnings: Vec<OrbitaError>,
}

/// Terminal state of one statistics series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub enum SeriesState {
    /// The series has not been driven to a terminal state yet.
    Pending,
    /// Every chunk down to the target start was merged.
    Satisfied,
    /// A chunk request failed; the message is safe to show to users.
    Failed {
        /// User-facing message.
        message: String,
    },
    /// The series cannot be displayed; sibling series are unaffected.
    Unavailable {
        /// Why the series was dropped.
        reason: String,
    },
    /// The owning token was cancelled; nothing further was merged.
    Cancelled,
}

impl SeriesState {
    /// True for `Satisfied`.
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

/// Outcome of driving one statistics series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesReport {
    /// Provider the series was fetched from.
    pub provider: ProviderKey,
    /// Terminal state.
    pub state: SeriesState,
    /// Window merged so far; `None` before the first chunk lands.
    pub covered: Option<TimeRange>,
    /// Chunk requests issued by the latest run.
    pub chunks_requested: usize,
}
