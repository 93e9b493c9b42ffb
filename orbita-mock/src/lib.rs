use async_trait::async_trait;
use orbita_core::{
    FindRecordsRequest, ImageryConnector, OrbitaError, ProviderKey, RecordPage, ResponseStatus,
    SearchProvider, StatisticsProvider, StatisticsRequest, StatisticsResponse,
};

mod dynamic;
mod fixtures;

pub use dynamic::{DynamicMockConnector, DynamicMockController, MockBehavior};
pub use fixtures::scenes::{REVISIT_DAYS, acquisitions, cloud_cover};
pub use fixtures::statistics::{cloud_fraction, vegetation};

/// Mock connector for CI-safe examples. Provides deterministic data from synthetic fixtures.
///
/// Scenes repeat every [`REVISIT_DAYS`] days. Statistics layers:
/// - `"B04_B08_B11"` answers three reflectance channels;
/// - `"FAIL"` fails with an XML service exception;
/// - `"UNAVAILABLE"` answers with a failed status;
/// - `"TIMEOUT"` answers after a short delay;
/// - anything else answers a single vegetation-index channel named after the layer.
///
/// With an auxiliary output the cloud mask channel `CLM` is appended last.
pub struct MockConnector;

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnector {
    /// Provider key of the mock.
    pub const KEY: ProviderKey = ProviderKey::new("orbita-mock");

    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    async fn maybe_fail_or_timeout(layer: &str) -> Result<(), OrbitaError> {
        match layer {
            "FAIL" => Err(OrbitaError::remote_payload(
                Self::KEY.as_str(),
                Some(400),
                "<?xml version=\"1.0\"?><ServiceExceptionReport version=\"1.3.0\">\
                 <ServiceException>Layer FAIL is not configured</ServiceException>\
                 </ServiceExceptionReport>",
            )),
            "TIMEOUT" => {
                // Keep short to avoid slowing tests excessively
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl ImageryConnector for MockConnector {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    fn label(&self) -> String {
        "Synthetic L2A".to_string()
    }

    fn as_search_provider(&self) -> Option<&dyn SearchProvider> {
        Some(self as &dyn SearchProvider)
    }

    fn as_statistics_provider(&self) -> Option<&dyn StatisticsProvider> {
        Some(self as &dyn StatisticsProvider)
    }
}

#[async_trait]
impl SearchProvider for MockConnector {
    async fn find_records(&self, req: &FindRecordsRequest) -> Result<RecordPage, OrbitaError> {
        Ok(fixtures::scenes::page(Self::KEY, req))
    }
}

#[async_trait]
impl StatisticsProvider for MockConnector {
    async fn statistics(
        &self,
        req: &StatisticsRequest,
    ) -> Result<StatisticsResponse, OrbitaError> {
        let layer = req.output.layer.as_str();
        Self::maybe_fail_or_timeout(layer).await?;
        Ok(match layer {
            "UNAVAILABLE" => StatisticsResponse {
                status: ResponseStatus::Failed("no data for the requested output".into()),
                channels: Vec::new(),
            },
            "B04_B08_B11" => fixtures::statistics::multi_band_response(req),
            _ => fixtures::statistics::vegetation_response(req),
        })
    }
}
