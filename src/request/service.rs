use async_trait::async_trait;
use log::debug;

use super::types::{Payload, RequestDescriptor, ResponseEnvelope};
use crate::core::callback;
use crate::core::error::NavigationError;
use crate::core::state::AppState;

/// One kind of request (JSON, content, custom).
///
/// Implementors only supply `fetch`; `execute` wraps it in the shared
/// cache-first algorithm:
///
/// ```text
/// cache hit?  ── yes ──► on_cached ──► callbacks(cached) ──► envelope
///     │ no
///     ▼
/// fetch() ──► write cache ──► callbacks(result) ──► envelope
/// ```
#[async_trait]
pub trait RequestService: Send + Sync {
    /// Returns the name of the service.
    fn name(&self) -> &str;

    /// Performs the type-specific fetch/load. No caching, no callbacks.
    async fn fetch(
        &self,
        state: &AppState,
        descriptor: &RequestDescriptor,
    ) -> Result<Payload, NavigationError>;

    /// Runs when the cache answers instead of `fetch`. Services that register
    /// side state while fetching restore it here.
    fn on_cached(&self, _state: &AppState, _cached: &Payload) {}

    async fn execute(
        &self,
        state: &AppState,
        descriptor: &RequestDescriptor,
    ) -> Result<ResponseEnvelope, NavigationError> {
        let name = descriptor
            .name()
            .map(|n| state.parser().execute(n))
            .unwrap_or_default();

        if descriptor.cache() {
            if name.is_empty() {
                return Err(NavigationError::Config(format!(
                    "cacheable {} request needs a name",
                    descriptor.kind()
                )));
            }

            if let Some(cached) = state.cache.get(&name) {
                debug!("[{}] cache hit for '{}'", self.name(), name);
                self.on_cached(state, &cached);
                callback::execute(&state.packages, descriptor.callback(), &cached).await?;
                return Ok(ResponseEnvelope::new(name, cached));
            }
            debug!("[{}] cache miss for '{}'", self.name(), name);
        }

        let response = self.fetch(state, descriptor).await?;

        if descriptor.cache() {
            state.cache.set(name.clone(), response.clone());
        }

        callback::execute(&state.packages, descriptor.callback(), &response).await?;
        Ok(ResponseEnvelope::new(name, response))
    }
}

/// Error for a descriptor handed to a service that doesn't handle its kind.
pub(crate) fn mismatch(service: &str, descriptor: &RequestDescriptor) -> NavigationError {
    NavigationError::Config(format!(
        "{service} service cannot execute a {} request",
        descriptor.kind()
    ))
}
