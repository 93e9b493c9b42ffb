use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::OrbitaError;
pub use orbita_types::ProviderKey;
use orbita_types::{
    FindRecordsRequest, Record, RecordPage, ResolutionLimits, StatisticsRequest,
    StatisticsResponse,
};

/// Focused role trait for providers that can page through matching records.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Return one page of records inside `req.range`, skipping `req.offset`
    /// records and returning at most `req.max_count`.
    ///
    /// Pages are expected newest first; the orchestrator re-sorts each page
    /// but cannot reorder records across pages.
    async fn find_records(&self, req: &FindRecordsRequest) -> Result<RecordPage, OrbitaError>;
}

/// Focused role trait for providers that aggregate per-day statistics.
#[async_trait]
pub trait StatisticsProvider: Send + Sync {
    /// Aggregate statistics for one bounded window.
    ///
    /// A service-side error body should be returned as
    /// [`OrbitaError::RemotePayload`] so a readable message can be extracted.
    async fn statistics(&self, req: &StatisticsRequest)
    -> Result<StatisticsResponse, OrbitaError>;
}

/// Main connector trait implemented by provider crates. Exposes capability discovery.
pub trait ImageryConnector: Send + Sync {
    /// A stable identifier used in selections and record attribution.
    fn name(&self) -> &'static str;

    /// Canonical provider key constructed from the static name.
    fn key(&self) -> ProviderKey {
        ProviderKey::new(self.name())
    }

    /// Human-friendly vendor string.
    fn vendor(&self) -> &'static str {
        "unknown"
    }

    /// Display label of the dataset this connector serves.
    fn label(&self) -> String {
        self.name().to_string()
    }

    /// Resolutions the statistics service accepts for this dataset.
    fn resolution_limits(&self) -> ResolutionLimits {
        ResolutionLimits::default()
    }

    /// Advertise search capability by returning a usable trait object reference when supported.
    fn as_search_provider(&self) -> Option<&dyn SearchProvider> {
        None
    }

    /// Advertise statistics capability by returning a usable trait object reference when supported.
    fn as_statistics_provider(&self) -> Option<&dyn StatisticsProvider> {
        None
    }
}

/// Query shape of catalog services that have no native paging contract.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    /// Service endpoint.
    pub url: String,
    /// `[min_lon, min_lat, max_lon, max_lat]`.
    pub bounds: [f64; 4],
    /// Window start.
    pub from: DateTime<Utc>,
    /// Window end (exclusive).
    pub to: DateTime<Utc>,
    /// Dataset/collection identifier.
    pub dataset_id: String,
    /// Page size.
    pub max_count: usize,
    /// Hits to skip.
    pub offset: usize,
    /// Provider-specific parameters passed through untouched.
    pub extra_params: BTreeMap<String, String>,
}

/// Raw hits returned by a [`CatalogSearch`].
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogHits<H> {
    /// Hits in service order.
    pub hits: Vec<H>,
    /// `None` when the service does not say; inferred from the page being full.
    pub has_more: Option<bool>,
}

/// A catalog search routine returning provider-native hits.
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Provider-native hit type.
    type Hit: Send;

    /// Run one catalog query.
    async fn query(&self, q: &CatalogQuery) -> Result<CatalogHits<Self::Hit>, OrbitaError>;

    /// Convert a native hit into a [`Record`]; `None` drops the hit.
    fn convert(&self, provider: ProviderKey, hit: Self::Hit) -> Option<Record>;
}

/// Adapts a [`CatalogSearch`] to the uniform [`SearchProvider`] contract.
pub struct CatalogProvider<C> {
    name: &'static str,
    url: String,
    dataset_id: String,
    extra_params: BTreeMap<String, String>,
    limits: ResolutionLimits,
    search: C,
}

impl<C: CatalogSearch> CatalogProvider<C> {
    /// Wrap `search` under the given provider name, endpoint and dataset.
    pub fn new(
        name: &'static str,
        url: impl Into<String>,
        dataset_id: impl Into<String>,
        search: C,
    ) -> Self {
        Self {
            name,
            url: url.into(),
            dataset_id: dataset_id.into(),
            extra_params: BTreeMap::new(),
            limits: ResolutionLimits::default(),
            search,
        }
    }

    /// Add a pass-through query parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.insert(key.into(), value.into());
        self
    }

    /// Wrapped catalog search.
    pub const fn search(&self) -> &C {
        &self.search
    }

    /// Override the advertised resolution limits.
    #[must_use]
    pub const fn with_resolution_limits(mut self, limits: ResolutionLimits) -> Self {
        self.limits = limits;
        self
    }
}

#[async_trait]
impl<C: CatalogSearch> SearchProvider for CatalogProvider<C> {
    async fn find_records(&self, req: &FindRecordsRequest) -> Result<RecordPage, OrbitaError> {
        let q = CatalogQuery {
            url: self.url.clone(),
            bounds: req.geometry.bounds(),
            from: req.range.start(),
            to: req.range.end(),
            dataset_id: self.dataset_id.clone(),
            max_count: req.max_count,
            offset: req.offset,
            extra_params: self.extra_params.clone(),
        };
        let CatalogHits { hits, has_more } = self.search.query(&q).await?;
        let fetched = hits.len();
        let key = ProviderKey::new(self.name);
        let records: Vec<Record> = hits
            .into_iter()
            .filter_map(|h| self.search.convert(key, h))
            .collect();
        Ok(RecordPage {
            skipped: fetched - records.len(),
            records,
            has_more: has_more.unwrap_or(fetched >= req.max_count),
        })
    }
}

impl<C: CatalogSearch> ImageryConnector for CatalogProvider<C> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn label(&self) -> String {
        format!("{} ({})", self.name, self.dataset_id)
    }

    fn resolution_limits(&self) -> ResolutionLimits {
        self.limits
    }

    fn as_search_provider(&self) -> Option<&dyn SearchProvider> {
        Some(self as &dyn SearchProvider)
    }
}
