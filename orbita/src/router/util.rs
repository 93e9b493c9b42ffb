use orbita_core::{Capability, OrbitaError};

/// Join a collection of tasks and apply an optional request-level deadline.
///
/// This wraps `futures::future::join_all(tasks)` with `crate::core::with_request_deadline`.
/// On timeout, the inner helper returns `OrbitaError::RequestTimeout("request")` which
/// call sites can remap to a more specific capability label as needed.
pub async fn join_with_deadline<I, F, T>(
    tasks: I,
    deadline: Option<std::time::Duration>,
) -> Result<Vec<T>, OrbitaError>
where
    I: IntoIterator<Item = F>,
    F: core::future::Future<Output = T>,
{
    crate::core::with_request_deadline(deadline, futures::future::join_all(tasks)).await
}

/// Collapse the errors of a request every provider failed into one outcome.
///
/// All `ProviderTimeout` → `AllProvidersTimedOut(capability)`; anything else
/// → `AllProvidersFailed(errors)`.
pub fn collapse_errors(capability: Capability, errors: Vec<OrbitaError>) -> OrbitaError {
    if !errors.is_empty()
        && errors
            .iter()
            .all(|e| matches!(e, OrbitaError::ProviderTimeout { .. }))
    {
        return OrbitaError::AllProvidersTimedOut {
            capability: capability.to_string(),
        };
    }
    OrbitaError::AllProvidersFailed(errors)
}
