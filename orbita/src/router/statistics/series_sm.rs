use chrono::{DateTime, TimeDelta, Utc};

use orbita_core::{ChannelSeries, ResponseStatus, SeriesState, StatisticsResponse, TimeRange};

/// Reason attached to a series whose primary channel count exceeds the
/// compare layout.
pub const MIXED_LAYER_COUNT: &str = "mixed output layer count";

/// Where a series is in its backward walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Not started.
    Idle,
    /// A chunk request is in flight.
    Fetching { chunk: TimeRange },
    /// A chunk arrived and is waiting to be merged.
    Merging { chunk: TimeRange },
    /// Covered down to the target start.
    Satisfied,
    /// A chunk request failed; not retried.
    Failed { message: String },
    /// The response cannot be displayed.
    Unavailable { reason: String },
    /// Stopped by the owning token.
    Cancelled,
}

impl Phase {
    /// True for phases no event other than `Extend` leaves.
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Satisfied | Self::Failed { .. } | Self::Unavailable { .. } | Self::Cancelled
        )
    }

    /// Public view of the phase.
    pub fn state(&self) -> SeriesState {
        match self {
            Self::Satisfied => SeriesState::Satisfied,
            Self::Failed { message } => SeriesState::Failed {
                message: message.clone(),
            },
            Self::Unavailable { reason } => SeriesState::Unavailable {
                reason: reason.clone(),
            },
            Self::Cancelled => SeriesState::Cancelled,
            Self::Idle | Self::Fetching { .. } | Self::Merging { .. } => SeriesState::Pending,
        }
    }
}

/// Inputs fed to [`SeriesMachine::handle`].
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Begin fetching.
    Start,
    /// The in-flight chunk answered.
    ChunkReceived { response: StatisticsResponse },
    /// The in-flight chunk failed with a user-facing message.
    ChunkFailed { message: String },
    /// The driver merged the chunk handed out by `Action::Merge`.
    Merged,
    /// Load more history: move the target start earlier and resume.
    Extend { target_from: DateTime<Utc> },
    /// The owning token fired.
    Cancel,
}

/// Side effects the driver performs.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Request statistics for this window.
    RequestChunk(TimeRange),
    /// Merge these channels, then feed back `Event::Merged`.
    Merge {
        chunk: TimeRange,
        channels: Vec<ChannelSeries>,
    },
}

/// Backward, chunked walk from the series end to its target start.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesMachine {
    /// Earliest instant the series should reach.
    pub target_from: DateTime<Utc>,
    /// Everything from here to the series end has been merged.
    pub covered_from: DateTime<Utc>,
    /// Widest chunk.
    pub max_chunk_span: TimeDelta,
    /// The last channel of a multi-channel response is auxiliary.
    pub auxiliary: bool,
    /// Compare layouts render at most this many primary channels.
    pub max_channels: Option<usize>,
    /// Current phase.
    pub phase: Phase,
}

impl SeriesMachine {
    /// Machine for `range`, nothing covered yet.
    pub const fn new(
        range: TimeRange,
        max_chunk_span: TimeDelta,
        auxiliary: bool,
        max_channels: Option<usize>,
    ) -> Self {
        Self {
            target_from: range.start(),
            covered_from: range.end(),
            max_chunk_span,
            auxiliary,
            max_channels,
            phase: Phase::Idle,
        }
    }

    /// Apply one event.
    pub fn handle(mut self, event: Event) -> (Self, Vec<Action>) {
        let prev_phase = std::mem::replace(&mut self.phase, Phase::Idle);
        match (prev_phase, event) {
            (Phase::Idle, Event::Start) => self.fetch_next(),
            (phase @ Phase::Idle, Event::Extend { target_from }) => {
                self.target_from = self.target_from.min(target_from);
                (Self { phase, ..self }, Vec::new())
            }
            (Phase::Satisfied, Event::Extend { target_from }) => {
                self.target_from = self.target_from.min(target_from);
                self.fetch_next()
            }
            (Phase::Fetching { chunk }, Event::ChunkReceived { response }) => {
                if let ResponseStatus::Failed(reason) = response.status {
                    return (
                        Self {
                            phase: Phase::Unavailable { reason },
                            ..self
                        },
                        Vec::new(),
                    );
                }
                if let Some(max) = self.max_channels
                    && self.primary_count(&response.channels) > max
                {
                    return (
                        Self {
                            phase: Phase::Unavailable {
                                reason: MIXED_LAYER_COUNT.to_string(),
                            },
                            ..self
                        },
                        Vec::new(),
                    );
                }
                (
                    Self {
                        phase: Phase::Merging { chunk },
                        ..self
                    },
                    vec![Action::Merge {
                        chunk,
                        channels: response.channels,
                    }],
                )
            }
            (Phase::Fetching { .. }, Event::ChunkFailed { message }) => (
                Self {
                    phase: Phase::Failed { message },
                    ..self
                },
                Vec::new(),
            ),
            (Phase::Merging { chunk }, Event::Merged) => {
                self.covered_from = chunk.start();
                self.fetch_next()
            }
            (phase, Event::Cancel) if !phase.is_terminal() => (
                Self {
                    phase: Phase::Cancelled,
                    ..self
                },
                Vec::new(),
            ),
            (phase, _) => (Self { phase, ..self }, Vec::new()),
        }
    }

    fn primary_count(&self, channels: &[ChannelSeries]) -> usize {
        if self.auxiliary && channels.len() > 1 {
            channels.len() - 1
        } else {
            channels.len()
        }
    }

    /// Next chunk ending at `covered_from`, or `Satisfied` once the target is reached.
    fn fetch_next(mut self) -> (Self, Vec<Action>) {
        if self.covered_from <= self.target_from {
            self.phase = Phase::Satisfied;
            return (self, Vec::new());
        }
        let from = if self.max_chunk_span > TimeDelta::zero() {
            self.covered_from
                .checked_sub_signed(self.max_chunk_span)
                .map_or(self.target_from, |f| f.max(self.target_from))
        } else {
            self.target_from
        };
        match TimeRange::new(from, self.covered_from) {
            Ok(chunk) => {
                self.phase = Phase::Fetching { chunk };
                (self, vec![Action::RequestChunk(chunk)])
            }
            Err(e) => {
                self.phase = Phase::Failed {
                    message: e.to_string(),
                };
                (self, Vec::new())
            }
        }
    }
}
