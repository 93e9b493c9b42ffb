use std::sync::Arc;
#[cfg(feature = "tracing")]
use std::convert::TryFrom;
use std::time::Duration;

use orbita_core::{
    DeriveOptions, ImageryConnector, IntervalLength, Months, OrbitaConfig, OrbitaError,
    ProviderKey, RenderMode,
};

/// Orchestrator that federates searches and drives statistics fetches across
/// registered providers.
pub struct Orbita {
    pub(crate) connectors: Vec<Arc<dyn ImageryConnector>>,
    pub(crate) cfg: OrbitaConfig,
}

/// Builder for constructing an `Orbita` orchestrator with custom configuration.
pub struct OrbitaBuilder {
    connectors: Vec<Arc<dyn ImageryConnector>>,
    cfg: OrbitaConfig,
}

impl Default for OrbitaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrbitaBuilder {
    /// Create a new builder with the default configuration.
    ///
    /// Starts with no connectors; register at least one via [`with_connector`](Self::with_connector).
    #[must_use]
    pub fn new() -> Self {
        Self {
            connectors: vec![],
            cfg: OrbitaConfig::default(),
        }
    }

    /// Register a provider connector.
    ///
    /// Registration order is the federation tie-break order: when two
    /// providers offer records with the same sensing time, the one registered
    /// first is emitted first.
    #[must_use]
    pub fn with_connector(mut self, c: Arc<dyn ImageryConnector>) -> Self {
        self.connectors.push(c);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, cfg: OrbitaConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Records requested per provider page.
    #[must_use]
    pub const fn page_size(mut self, n: usize) -> Self {
        self.cfg.page_size = n;
        self
    }

    /// Widest window a single statistics request may cover.
    #[must_use]
    pub const fn max_chunk_span(mut self, span: Duration) -> Self {
        self.cfg.max_chunk_span = span;
        self
    }

    /// Set the per-provider request timeout (one page or one chunk).
    #[must_use]
    pub const fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.provider_timeout = timeout;
        self
    }

    /// Set an overall deadline for compare-mode statistics.
    ///
    /// When exceeded, returns a `RequestTimeout` error for the capability.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.request_timeout = Some(timeout);
        self
    }

    /// Default statistics interval when a query names no explicit range.
    #[must_use]
    pub const fn interval(mut self, interval: IntervalLength) -> Self {
        self.cfg.interval = interval;
        self
    }

    /// Default allowed-months filter for searches.
    #[must_use]
    pub const fn months(mut self, months: Months) -> Self {
        self.cfg.months = months;
        self
    }

    /// Drop statistics samples whose auxiliary value (percent) exceeds `pct`.
    #[must_use]
    pub const fn max_auxiliary_value(mut self, pct: u8) -> Self {
        self.cfg.max_auxiliary_value = Some(pct);
        self
    }

    /// Request histograms and derive distribution bands.
    #[must_use]
    pub const fn distribution(mut self, yes: bool) -> Self {
        self.cfg.distribution = yes;
        self
    }

    /// Decimal places kept in derived value ranges.
    #[must_use]
    pub const fn value_precision(mut self, places: u32) -> Self {
        self.cfg.value_precision = places;
        self
    }

    /// Layout the statistics are rendered in.
    #[must_use]
    pub const fn render_mode(mut self, mode: RenderMode) -> Self {
        self.cfg.render_mode = mode;
        self
    }

    /// Build the `Orbita` orchestrator.
    ///
    /// # Errors
    /// Returns `InvalidArg` if no connectors have been registered, if the page
    /// size or chunk span is zero, or if the auxiliary threshold exceeds 100.
    pub fn build(self) -> Result<Orbita, OrbitaError> {
        if self.connectors.is_empty() {
            return Err(OrbitaError::InvalidArg(
                "no connectors registered; add at least one via with_connector(...)".to_string(),
            ));
        }
        if self.cfg.page_size == 0 {
            return Err(OrbitaError::InvalidArg("page_size must be positive".into()));
        }
        if self.cfg.max_chunk_span.is_zero() {
            return Err(OrbitaError::InvalidArg(
                "max_chunk_span must be positive".into(),
            ));
        }
        if let Some(pct) = self.cfg.max_auxiliary_value
            && pct > 100
        {
            return Err(OrbitaError::InvalidArg(format!(
                "max_auxiliary_value is a percentage, got {pct}"
            )));
        }
        Ok(Orbita {
            connectors: self.connectors,
            cfg: self.cfg,
        })
    }
}

/// Attach provider identity to an error unless it already carries one.
pub fn tag_err(connector: &str, e: OrbitaError) -> OrbitaError {
    match e {
        e @ (OrbitaError::NotFound { .. }
        | OrbitaError::ProviderTimeout { .. }
        | OrbitaError::Connector { .. }
        | OrbitaError::RequestTimeout { .. }
        | OrbitaError::AllProvidersTimedOut { .. }
        | OrbitaError::AllProvidersFailed(_)
        | OrbitaError::Cancelled) => e,
        other => OrbitaError::Connector {
            connector: connector.to_string(),
            msg: other.to_string(),
        },
    }
}

/// Run `fut` under an optional overall deadline.
pub(crate) async fn with_request_deadline<F, T>(
    deadline: Option<Duration>,
    fut: F,
) -> Result<T, OrbitaError>
where
    F: core::future::Future<Output = T>,
{
    match deadline {
        Some(d) => tokio::time::timeout(d, fut)
            .await
            .map_err(|_| OrbitaError::request_timeout("request")),
        None => Ok(fut.await),
    }
}

impl Orbita {
    /// Wrap a provider future with a timeout and standardized timeout error mapping.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "orbita::core::provider_call_with_timeout",
            skip(fut),
            fields(
                connector = connector_name,
                capability = capability,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            ),
        )
    )]
    pub(crate) async fn provider_call_with_timeout<T, Fut>(
        connector_name: &'static str,
        capability: &'static str,
        timeout: Duration,
        fut: Fut,
    ) -> Result<T, OrbitaError>
    where
        Fut: core::future::Future<Output = Result<T, OrbitaError>>,
    {
        (tokio::time::timeout(timeout, fut).await)
            .unwrap_or_else(|_| Err(OrbitaError::provider_timeout(connector_name, capability)))
    }

    /// Start building a new `Orbita` instance.
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use orbita::{Orbita, Months};
    ///
    /// let orbita = Orbita::builder()
    ///     .with_connector(Arc::new(orbita_mock::MockConnector::new()))
    ///     .page_size(25)
    ///     .months(Months::JUNE | Months::JULY | Months::AUGUST)
    ///     .build()?;
    /// ```
    #[must_use]
    pub fn builder() -> OrbitaBuilder {
        OrbitaBuilder::new()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &OrbitaConfig {
        &self.cfg
    }

    /// Derivation options implied by the configuration.
    #[must_use]
    pub fn derive_options(&self) -> DeriveOptions {
        DeriveOptions {
            max_auxiliary_value: self.cfg.max_auxiliary_value.map(f64::from),
            distribution: self.cfg.distribution,
            precision: self.cfg.value_precision,
        }
    }

    /// Registered connectors in registration order, optionally restricted to `only`.
    pub(crate) fn selected(&self, only: Option<&[ProviderKey]>) -> Vec<Arc<dyn ImageryConnector>> {
        self.connectors
            .iter()
            .filter(|c| only.is_none_or(|keys| keys.contains(&c.key())))
            .cloned()
            .collect()
    }

    /// Look up one registered connector by key.
    pub(crate) fn connector(&self, key: ProviderKey) -> Option<Arc<dyn ImageryConnector>> {
        self.connectors.iter().find(|c| c.key() == key).cloned()
    }
}
