//! Federated, time-ordered search across paginated providers.
//!
//! A [`SearchSession`] walks the month-filtered sub-ranges of a query most
//! recent first. Within one sub-range an [`IntervalSession`] k-way merges one
//! [`ProviderCursor`] per provider by sensing time, so the concatenated output
//! of successive `next_n_results` calls is non-increasing by sensing time with
//! no gaps or duplicates.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::Orbita;
use crate::core::tag_err;
use crate::router::util::collapse_errors;
use orbita_core::{
    Capability, FindRecordsRequest, Geometry, ImageryConnector, Months, OrbitaError, ProviderKey,
    Record, SearchBatch, SearchReport, TimeRange, partition,
};

/// What to search for.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Area of interest.
    pub geometry: Geometry,
    /// Overall window.
    pub range: TimeRange,
    /// Allowed months; `None` uses the configured default.
    pub months: Option<Months>,
    /// Restrict to these providers; `None` uses every search-capable one.
    pub providers: Option<Vec<ProviderKey>>,
}

impl SearchQuery {
    /// Query over `range` with the configured months and every provider.
    #[must_use]
    pub const fn new(geometry: Geometry, range: TimeRange) -> Self {
        Self {
            geometry,
            range,
            months: None,
            providers: None,
        }
    }

    /// Restrict to the given months.
    #[must_use]
    pub const fn months(mut self, months: Months) -> Self {
        self.months = Some(months);
        self
    }

    /// Restrict to the given providers.
    #[must_use]
    pub fn providers(mut self, keys: &[ProviderKey]) -> Self {
        self.providers = Some(keys.to_vec());
        self
    }
}

/// Lazily pages one provider over one window, newest record first.
///
/// At most one page is buffered; a new page is fetched only once the buffer
/// has been consumed.
pub struct ProviderCursor {
    connector: Arc<dyn ImageryConnector>,
    geometry: Geometry,
    range: TimeRange,
    page_size: usize,
    timeout: Duration,
    buffer: VecDeque<Record>,
    offset: usize,
    has_more: bool,
    failed: bool,
}

impl ProviderCursor {
    /// Cursor over `range` that has not fetched anything yet.
    #[must_use]
    pub const fn new(
        connector: Arc<dyn ImageryConnector>,
        geometry: Geometry,
        range: TimeRange,
        page_size: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            connector,
            geometry,
            range,
            page_size,
            timeout,
            buffer: VecDeque::new(),
            offset: 0,
            has_more: true,
            failed: false,
        }
    }

    /// Provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.connector.name()
    }

    /// True once a page request failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        self.failed
    }

    /// True when no further record can come out of this cursor.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.buffer.is_empty() && (self.failed || !self.has_more)
    }

    /// Peek the sensing time of the next record, fetching one page if the
    /// buffer is empty and the provider may have more.
    ///
    /// # Errors
    /// - `Cancelled` if `cancel` fires while a page is in flight; the cursor
    ///   is left as it was.
    /// - The page error, tagged with the provider name. It is returned once;
    ///   afterwards the cursor reports exhaustion.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "orbita::search::next_date",
            skip(self, cancel),
            fields(provider = self.connector.name(), offset = self.offset),
        )
    )]
    pub async fn next_date(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<DateTime<Utc>>, OrbitaError> {
        if let Some(r) = self.buffer.front() {
            return Ok(Some(r.sensing_time));
        }
        if self.failed || !self.has_more {
            return Ok(None);
        }

        let connector = Arc::clone(&self.connector);
        let name = connector.name();
        let Some(sp) = connector.as_search_provider() else {
            self.has_more = false;
            return Ok(None);
        };
        let req = FindRecordsRequest {
            geometry: self.geometry.clone(),
            range: self.range,
            max_count: self.page_size,
            offset: self.offset,
        };
        let call = Orbita::provider_call_with_timeout(
            name,
            Capability::Search.as_str(),
            self.timeout,
            sp.find_records(&req),
        );
        let res = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(OrbitaError::Cancelled),
            res = call => res,
        };

        match res {
            Ok(page) => {
                let mut records = page.records;
                records.sort_by(|a, b| b.sensing_time.cmp(&a.sensing_time));
                self.offset += records.len() + page.skipped;
                // A page with nothing in it ends the cursor whatever the provider claims.
                self.has_more = page.has_more && records.len() + page.skipped > 0;
                self.buffer.extend(records);
                Ok(self.buffer.front().map(|r| r.sensing_time))
            }
            Err(e) => {
                self.failed = true;
                #[cfg(feature = "tracing")]
                {
                    if e.is_actionable() {
                        tracing::warn!(provider = name, error = %e, "search page failed; dropping provider");
                    } else {
                        tracing::debug!(provider = name, error = %e, "search provider has nothing here; dropping it");
                    }
                }
                Err(tag_err(name, e))
            }
        }
    }

    /// Take the record whose date the last `next_date` call returned.
    ///
    /// # Panics
    /// Panics when no record is buffered, i.e. without a preceding
    /// `Ok(Some(_))` from [`next_date`](Self::next_date).
    pub fn next_record(&mut self) -> Record {
        self.buffer
            .pop_front()
            .expect("next_record called without a peeked record")
    }
}

/// K-way merge of the cursors of one sub-range.
pub struct IntervalSession {
    range: TimeRange,
    cursors: Vec<ProviderCursor>,
}

impl IntervalSession {
    /// Merge `cursors`; their order is the tie-break order.
    #[must_use]
    pub const fn new(range: TimeRange, cursors: Vec<ProviderCursor>) -> Self {
        Self { range, cursors }
    }

    /// Sub-range this session covers.
    #[must_use]
    pub const fn range(&self) -> TimeRange {
        self.range
    }

    /// True when every cursor is exhausted.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursors.iter().all(ProviderCursor::is_exhausted)
    }

    fn failed_providers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.cursors
            .iter()
            .filter(|c| c.is_failed())
            .map(ProviderCursor::name)
    }

    /// Up to `n` records, most recent first.
    ///
    /// Each step peeks every cursor concurrently and consumes from the one
    /// with the latest date; ties go to the lowest cursor index. The output is
    /// non-increasing only if every provider pages newest first, as
    /// [`SearchProvider::find_records`](orbita_core::SearchProvider::find_records)
    /// requires. Fewer than
    /// `n` records means the sub-range is exhausted. Provider failures are
    /// pushed to `warnings` and the merge continues without that provider.
    ///
    /// # Errors
    /// Returns `Cancelled` if `cancel` fires.
    pub async fn next_n_records(
        &mut self,
        n: usize,
        cancel: &CancellationToken,
        warnings: &mut Vec<OrbitaError>,
    ) -> Result<Vec<Record>, OrbitaError> {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            if cancel.is_cancelled() {
                return Err(OrbitaError::Cancelled);
            }
            let peeks = join_all(self.cursors.iter_mut().map(|c| c.next_date(cancel))).await;

            let mut winner: Option<(usize, DateTime<Utc>)> = None;
            for (i, peek) in peeks.into_iter().enumerate() {
                match peek {
                    Ok(Some(d)) => {
                        if winner.is_none_or(|(_, best)| d > best) {
                            winner = Some((i, d));
                        }
                    }
                    Ok(None) => {}
                    Err(OrbitaError::Cancelled) => return Err(OrbitaError::Cancelled),
                    Err(e) => warnings.push(e),
                }
            }
            let Some((i, _)) = winner else { break };
            out.push(self.cursors[i].next_record());
        }
        Ok(out)
    }
}

/// A federated search over every allowed sub-range of a query.
pub struct SearchSession {
    connectors: Vec<Arc<dyn ImageryConnector>>,
    geometry: Geometry,
    page_size: usize,
    timeout: Duration,
    /// Remaining sub-ranges, ascending; the most recent is popped next.
    pending: Vec<TimeRange>,
    current: Option<IntervalSession>,
    dropped: HashSet<&'static str>,
    cancel: CancellationToken,
}

impl SearchSession {
    fn open(&self, range: TimeRange) -> IntervalSession {
        let cursors = self
            .connectors
            .iter()
            .filter(|c| !self.dropped.contains(c.name()))
            .map(|c| {
                ProviderCursor::new(
                    Arc::clone(c),
                    self.geometry.clone(),
                    range,
                    self.page_size,
                    self.timeout,
                )
            })
            .collect();
        IntervalSession::new(range, cursors)
    }

    fn advance(&mut self) {
        if let Some(done) = self.current.take() {
            self.dropped.extend(done.failed_providers());
        }
        self.current = self.pending.pop().map(|r| self.open(r));
        #[cfg(feature = "tracing")]
        {
            if let Some(cur) = &self.current {
                tracing::debug!(range = %cur.range(), "advancing to earlier sub-range");
            }
        }
    }

    /// True once every provider of the session has failed.
    fn all_failed(&self) -> bool {
        let failed_now: HashSet<&'static str> = self
            .current
            .iter()
            .flat_map(|c| c.failed_providers())
            .collect();
        self.connectors
            .iter()
            .all(|c| self.dropped.contains(c.name()) || failed_now.contains(c.name()))
    }

    /// True while the current or a later sub-range may still yield records.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.current.as_ref().is_some_and(|c| !c.is_exhausted()) || !self.pending.is_empty()
    }

    /// The next `n` records across all providers and sub-ranges.
    ///
    /// `response` is `None` when the session's token was cancelled; records in
    /// flight are discarded. When nothing was found because every provider
    /// failed, the per-provider warnings are folded into one aggregate
    /// (`AllProvidersTimedOut` or `AllProvidersFailed`).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "orbita::search::next_n_results", skip(self))
    )]
    pub async fn next_n_results(&mut self, n: usize) -> SearchReport {
        let mut results: Vec<Record> = Vec::with_capacity(n);
        let mut warnings: Vec<OrbitaError> = Vec::new();
        let cancel = self.cancel.clone();

        while results.len() < n {
            if cancel.is_cancelled() {
                break;
            }
            let Some(current) = self.current.as_mut() else {
                break;
            };
            match current
                .next_n_records(n - results.len(), &cancel, &mut warnings)
                .await
            {
                Ok(batch) => results.extend(batch),
                Err(e) if e.is_cancelled() => break,
                Err(e) => warnings.push(e),
            }
            if results.len() < n {
                self.advance();
            }
        }

        if cancel.is_cancelled() {
            #[cfg(feature = "tracing")]
            tracing::debug!("search session cancelled; discarding batch");
            return SearchReport {
                response: None,
                warnings,
            };
        }
        if results.is_empty() && !warnings.is_empty() && self.all_failed() {
            let collapsed = collapse_errors(Capability::Search, warnings);
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %collapsed, "every search provider failed");
            warnings = vec![collapsed];
        }
        SearchReport {
            response: Some(SearchBatch {
                results,
                has_more: self.has_more(),
            }),
            warnings,
        }
    }
}

impl Orbita {
    /// Open a federated search session.
    ///
    /// Validation happens here, before any provider is contacted.
    ///
    /// # Errors
    /// - `InvalidArg` for a zero page size.
    /// - `Unsupported` when no selected provider offers search.
    /// - `NotFound` when no allowed month falls inside the range.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "orbita::search", skip(self, query, cancel), fields(range = %query.range))
    )]
    pub fn search(
        &self,
        query: SearchQuery,
        cancel: CancellationToken,
    ) -> Result<SearchSession, OrbitaError> {
        if self.cfg.page_size == 0 {
            return Err(OrbitaError::InvalidArg("page_size must be positive".into()));
        }
        let connectors: Vec<Arc<dyn ImageryConnector>> = self
            .selected(query.providers.as_deref())
            .into_iter()
            .filter(|c| c.as_search_provider().is_some())
            .collect();
        if connectors.is_empty() {
            return Err(OrbitaError::unsupported(Capability::Search.as_str()));
        }
        let months = query.months.unwrap_or(self.cfg.months);
        let pending = partition(&query.range, months);
        if pending.is_empty() {
            return Err(OrbitaError::not_found(format!(
                "records: no allowed month in {}",
                query.range
            )));
        }

        let mut session = SearchSession {
            connectors,
            geometry: query.geometry,
            page_size: self.cfg.page_size,
            timeout: self.cfg.provider_timeout,
            pending,
            current: None,
            dropped: HashSet::new(),
            cancel,
        };
        session.advance();
        Ok(session)
    }
}
