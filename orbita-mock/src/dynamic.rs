use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use orbita_core::{
    FindRecordsRequest, ImageryConnector, OrbitaError, Record, RecordPage, SearchProvider,
    StatisticsProvider, StatisticsRequest, StatisticsResponse,
};

/// Instruction for how a method should behave for a given input.
#[derive(Clone)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(OrbitaError),
    /// Hang indefinitely (simulate a timeout).
    Hang,
}

#[derive(Default)]
struct InternalState {
    search_rule: Option<MockBehavior<Vec<Record>>>,
    statistics_rules: HashMap<String, MockBehavior<StatisticsResponse>>,
    search_requests: Vec<FindRecordsRequest>,
    statistics_requests: Vec<StatisticsRequest>,
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockController {
    /// Set the behavior for `find_records` calls.
    ///
    /// `Return(records)` is served page by page: records inside the requested
    /// window, newest first, sliced by the request's offset and page size.
    pub async fn set_search_behavior(&self, behavior: MockBehavior<Vec<Record>>) {
        let mut guard = self.state.lock().await;
        guard.search_rule = Some(behavior);
    }

    /// Set the behavior for `statistics` calls for a specific layer.
    pub async fn set_statistics_behavior(
        &self,
        layer: impl Into<String>,
        behavior: MockBehavior<StatisticsResponse>,
    ) {
        let mut guard = self.state.lock().await;
        guard.statistics_rules.insert(layer.into(), behavior);
    }

    /// Return a copy of the page requests received so far.
    pub async fn search_requests(&self) -> Vec<FindRecordsRequest> {
        self.state.lock().await.search_requests.clone()
    }

    /// Return a copy of the statistics requests received so far.
    pub async fn statistics_requests(&self) -> Vec<StatisticsRequest> {
        self.state.lock().await.statistics_requests.clone()
    }

    /// Clear all configured behaviors and request logs.
    pub async fn clear_all_behaviors(&self) {
        let mut guard = self.state.lock().await;
        guard.search_rule = None;
        guard.statistics_rules.clear();
        guard.search_requests.clear();
        guard.statistics_requests.clear();
    }
}

/// A connector that defers all behavior to an external controller.
pub struct DynamicMockConnector {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockConnector {
    /// Create a new dynamic mock connector and its controller.
    #[must_use]
    pub fn new_with_controller(
        name: &'static str,
    ) -> (Arc<dyn ImageryConnector>, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = DynamicMockController {
            state: Arc::clone(&state),
        };
        let me = Arc::new(Self { name, state });
        (me as Arc<dyn ImageryConnector>, controller)
    }
}

impl ImageryConnector for DynamicMockConnector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "DynamicMock"
    }

    fn as_search_provider(&self) -> Option<&dyn SearchProvider> {
        Some(self as &dyn SearchProvider)
    }

    fn as_statistics_provider(&self) -> Option<&dyn StatisticsProvider> {
        Some(self as &dyn StatisticsProvider)
    }
}

#[async_trait]
impl SearchProvider for DynamicMockConnector {
    async fn find_records(&self, req: &FindRecordsRequest) -> Result<RecordPage, OrbitaError> {
        // Acquire behavior snapshot without holding the lock across await points
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.search_requests.push(req.clone());
            guard.search_rule.clone()
        };

        match behavior {
            Some(MockBehavior::Return(records)) => {
                let mut inside: Vec<Record> = records
                    .into_iter()
                    .filter(|r| req.range.contains(r.sensing_time))
                    .collect();
                inside.sort_by(|a, b| b.sensing_time.cmp(&a.sensing_time));
                let total = inside.len();
                let records: Vec<Record> = inside
                    .into_iter()
                    .skip(req.offset)
                    .take(req.max_count)
                    .collect();
                Ok(RecordPage {
                    has_more: req.offset + records.len() < total,
                    records,
                    skipped: 0,
                })
            }
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => Err(OrbitaError::unsupported("search")),
        }
    }
}

#[async_trait]
impl StatisticsProvider for DynamicMockConnector {
    async fn statistics(
        &self,
        req: &StatisticsRequest,
    ) -> Result<StatisticsResponse, OrbitaError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.statistics_requests.push(req.clone());
            guard.statistics_rules.get(&req.output.layer).cloned()
        };

        match behavior {
            Some(MockBehavior::Return(resp)) => Ok(resp),
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => Err(OrbitaError::unsupported("statistics")),
        }
    }
}
