//! Windowed, backward statistics fetching.
//!
//! A [`SeriesMachine`] decides which chunk to request next; a [`SeriesFetcher`]
//! performs the requests and owns the accumulator the chunks merge into.
//! Compare layouts run one independent fetcher per layer.

mod fetcher;
pub mod series_sm;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

pub use fetcher::{DISTRIBUTION_BINS, SeriesFetcher, StatisticsQuery};
pub use series_sm::{Action, Event, MIXED_LAYER_COUNT, Phase, SeriesMachine};

use crate::Orbita;
use crate::router::util::join_with_deadline;
use orbita_core::OrbitaError;

impl Orbita {
    /// Prepare a statistics series for `query`.
    ///
    /// Nothing is fetched until [`SeriesFetcher::run`] is awaited.
    ///
    /// # Errors
    /// - `NotFound` when no registered connector has the query's provider key.
    /// - `Unsupported` when that connector offers no statistics.
    /// - `InvalidArg` for a bad resolution or chunk span.
    pub fn statistics(&self, query: StatisticsQuery) -> Result<SeriesFetcher, OrbitaError> {
        let connector = self
            .connector(query.provider)
            .ok_or_else(|| OrbitaError::not_found(format!("provider {}", query.provider)))?;
        let range = match query.range {
            Some(r) => r,
            None => self.cfg.interval.ending_at(Utc::now())?,
        };
        SeriesFetcher::new(connector, query, range, &self.cfg, self.derive_options())
    }

    /// Fetch several series side by side, one independent fetcher each.
    ///
    /// Every query is validated before anything is fetched. A series that
    /// fails or is unavailable does not affect its siblings; inspect each
    /// fetcher's [`report`](SeriesFetcher::report).
    ///
    /// # Errors
    /// - `InvalidArg` for an empty query list.
    /// - The first validation error of [`statistics`](Self::statistics).
    /// - `RequestTimeout` when the configured request deadline passes.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "orbita::compare_statistics",
            skip(self, queries, cancel),
            fields(series = queries.len()),
        )
    )]
    pub async fn compare_statistics(
        &self,
        queries: Vec<StatisticsQuery>,
        cancel: &CancellationToken,
    ) -> Result<Vec<SeriesFetcher>, OrbitaError> {
        if queries.is_empty() {
            return Err(OrbitaError::InvalidArg(
                "compare_statistics needs at least one query".into(),
            ));
        }
        let mut fetchers = queries
            .into_iter()
            .map(|q| self.statistics(q))
            .collect::<Result<Vec<_>, _>>()?;

        join_with_deadline(
            fetchers.iter_mut().map(|f| f.run(cancel)),
            self.cfg.request_timeout,
        )
        .await
        .map_err(|e| match e {
            OrbitaError::RequestTimeout { .. } => OrbitaError::request_timeout("statistics"),
            other => other,
        })?;
        Ok(fetchers)
    }
}
