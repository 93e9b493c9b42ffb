use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio_util::sync::CancellationToken;

use super::series_sm::{Action, Event, SeriesMachine};
use crate::Orbita;
use orbita_core::{
    Capability, DeriveOptions, DerivedSeries, Geometry, ImageryConnector, OrbitaConfig,
    OrbitaError, OutputSelector, ProviderKey, RenderMode, SeriesReport, StatisticsRequest,
    StatsAccumulator, TimeRange, failure_message,
};

/// Histogram bins requested when distribution bands are enabled.
pub const DISTRIBUTION_BINS: u32 = 10;

/// One statistics series: a provider, an area and an output selection.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsQuery {
    /// Provider to ask.
    pub provider: ProviderKey,
    /// Area to aggregate over.
    pub geometry: Geometry,
    /// Coordinate reference system of `geometry`.
    pub crs: String,
    /// Layer and auxiliary-channel selection.
    pub output: OutputSelector,
    /// Window; `None` means the configured interval ending now.
    pub range: Option<TimeRange>,
    /// Requested meters per pixel; clamped to the provider's limits.
    pub resolution: f64,
}

impl StatisticsQuery {
    /// Query in `EPSG:4326` at 10 m/px over the configured interval.
    #[must_use]
    pub fn new(provider: ProviderKey, geometry: Geometry, output: OutputSelector) -> Self {
        Self {
            provider,
            geometry,
            crs: "EPSG:4326".to_string(),
            output,
            range: None,
            resolution: 10.0,
        }
    }

    /// Fetch over an explicit window.
    #[must_use]
    pub const fn range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Requested resolution in meters per pixel.
    #[must_use]
    pub const fn resolution(mut self, meters_per_pixel: f64) -> Self {
        self.resolution = meters_per_pixel;
        self
    }

    /// Coordinate reference system of the geometry.
    #[must_use]
    pub fn crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = crs.into();
        self
    }
}

/// Drives one [`SeriesMachine`] against a statistics provider and owns the
/// series' accumulator.
///
/// Chunks are requested strictly one after another, newest first. The token
/// is checked before each request and before each merge, so a cancelled run
/// never changes the accumulator.
pub struct SeriesFetcher {
    connector: Arc<dyn ImageryConnector>,
    geometry: Geometry,
    crs: String,
    output: OutputSelector,
    resolution: f64,
    bins: Option<u32>,
    timeout: Duration,
    machine: SeriesMachine,
    accumulator: StatsAccumulator,
    derive_options: DeriveOptions,
    chunks_requested: usize,
}

impl core::fmt::Debug for SeriesFetcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SeriesFetcher")
            .field("provider", &self.connector.name())
            .field("machine", &self.machine)
            .field("chunks_requested", &self.chunks_requested)
            .finish_non_exhaustive()
    }
}

impl SeriesFetcher {
    /// Fetcher for `query` over `range`.
    ///
    /// # Errors
    /// - `Unsupported` when the connector offers no statistics.
    /// - `InvalidArg` for a non-positive resolution, an unusable chunk span, or
    ///   connector resolution limits that are inverted, non-finite or non-positive.
    pub fn new(
        connector: Arc<dyn ImageryConnector>,
        query: StatisticsQuery,
        range: TimeRange,
        cfg: &OrbitaConfig,
        derive_options: DeriveOptions,
    ) -> Result<Self, OrbitaError> {
        if connector.as_statistics_provider().is_none() {
            return Err(OrbitaError::unsupported(Capability::Statistics.as_str()));
        }
        if !(query.resolution.is_finite() && query.resolution > 0.0) {
            return Err(OrbitaError::InvalidArg(format!(
                "resolution must be positive, got {}",
                query.resolution
            )));
        }
        let span = TimeDelta::from_std(cfg.max_chunk_span)
            .map_err(|e| OrbitaError::InvalidArg(format!("max_chunk_span: {e}")))?;
        if span <= TimeDelta::zero() {
            return Err(OrbitaError::InvalidArg(
                "max_chunk_span must be positive".into(),
            ));
        }
        let max_channels = match cfg.render_mode {
            RenderMode::Compare { max_channels } => Some(max_channels),
            RenderMode::Single | _ => None,
        };
        let limits = connector.resolution_limits();
        let resolution = limits.clamp(query.resolution).ok_or_else(|| {
            OrbitaError::InvalidArg(format!(
                "{} advertises unusable resolution limits {}..{}",
                connector.name(),
                limits.min_meters_per_pixel,
                limits.max_meters_per_pixel
            ))
        })?;
        Ok(Self {
            machine: SeriesMachine::new(range, span, query.output.auxiliary, max_channels),
            connector,
            geometry: query.geometry,
            crs: query.crs,
            output: query.output,
            resolution,
            bins: cfg.distribution.then_some(DISTRIBUTION_BINS),
            timeout: cfg.provider_timeout,
            accumulator: StatsAccumulator::new(),
            derive_options,
            chunks_requested: 0,
        })
    }

    /// Provider this series is fetched from.
    #[must_use]
    pub fn provider(&self) -> ProviderKey {
        self.connector.key()
    }

    /// Current state machine.
    #[must_use]
    pub const fn machine(&self) -> &SeriesMachine {
        &self.machine
    }

    /// Samples merged so far.
    #[must_use]
    pub const fn accumulator(&self) -> &StatsAccumulator {
        &self.accumulator
    }

    /// Give up the fetcher, keeping its samples.
    #[must_use]
    pub fn into_accumulator(self) -> StatsAccumulator {
        self.accumulator
    }

    /// Chart series derived with the orchestrator's options.
    #[must_use]
    pub fn derive(&self) -> DerivedSeries {
        self.accumulator.derive(&self.derive_options)
    }

    /// Snapshot of the series outcome.
    #[must_use]
    pub fn report(&self) -> SeriesReport {
        SeriesReport {
            provider: self.provider(),
            state: self.machine.phase.state(),
            covered: self.accumulator.covered(),
            chunks_requested: self.chunks_requested,
        }
    }

    /// Fetch from the series end back to its start.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "orbita::statistics::run",
            skip(self, cancel),
            fields(provider = self.connector.name(), layer = %self.output.layer),
        )
    )]
    pub async fn run(&mut self, cancel: &CancellationToken) -> SeriesReport {
        self.chunks_requested = 0;
        let actions = self.step(Event::Start);
        self.drive(actions, cancel).await
    }

    /// Load more history: continue backwards down to `target_from`.
    ///
    /// Only a satisfied (or not yet started) series moves; failed, unavailable
    /// and cancelled series report their state unchanged.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "orbita::statistics::extend",
            skip(self, cancel),
            fields(provider = self.connector.name(), target_from = %target_from),
        )
    )]
    pub async fn extend(
        &mut self,
        target_from: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> SeriesReport {
        self.chunks_requested = 0;
        let actions = self.step(Event::Extend { target_from });
        self.drive(actions, cancel).await
    }

    fn step(&mut self, event: Event) -> Vec<Action> {
        let (next, actions) = self.machine.clone().handle(event);
        self.machine = next;
        actions
    }

    async fn drive(&mut self, actions: Vec<Action>, cancel: &CancellationToken) -> SeriesReport {
        let mut queue = std::collections::VecDeque::from(actions);
        while let Some(action) = queue.pop_front() {
            if cancel.is_cancelled() {
                #[cfg(feature = "tracing")]
                tracing::debug!(provider = self.connector.name(), "statistics series cancelled");
                queue.extend(self.step(Event::Cancel));
                continue;
            }
            let event = match action {
                Action::RequestChunk(chunk) => self.request_chunk(chunk, cancel).await,
                Action::Merge { chunk, channels } => {
                    self.accumulator.merge(channels, self.output.auxiliary);
                    self.accumulator.record_coverage(chunk);
                    #[cfg(feature = "tracing")]
                    tracing::debug!(chunk = %chunk, "merged statistics chunk");
                    Event::Merged
                }
            };
            queue.extend(self.step(event));
        }
        #[cfg(feature = "tracing")]
        {
            if let orbita_core::SeriesState::Unavailable { reason } = self.machine.phase.state() {
                tracing::warn!(provider = self.connector.name(), %reason, "statistics series unavailable");
            }
        }
        self.report()
    }

    async fn request_chunk(&mut self, chunk: TimeRange, cancel: &CancellationToken) -> Event {
        let Some(sp) = self.connector.as_statistics_provider() else {
            return Event::ChunkFailed {
                message: failure_message(&OrbitaError::unsupported(
                    Capability::Statistics.as_str(),
                )),
            };
        };
        let req = StatisticsRequest {
            geometry: self.geometry.clone(),
            crs: self.crs.clone(),
            range: chunk,
            resolution: self.resolution,
            bins: self.bins,
            output: self.output.clone(),
        };
        self.chunks_requested += 1;
        let call = Orbita::provider_call_with_timeout(
            self.connector.name(),
            Capability::Statistics.as_str(),
            self.timeout,
            sp.statistics(&req),
        );
        tokio::select! {
            biased;
            () = cancel.cancelled() => Event::Cancel,
            res = call => match res {
                Ok(response) => Event::ChunkReceived { response },
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(provider = self.connector.name(), chunk = %chunk, error = %e, "statistics chunk failed");
                    Event::ChunkFailed { message: failure_message(&e) }
                }
            },
        }
    }
}
