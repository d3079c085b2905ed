use std::sync::Arc;

use futures::future::try_join_all;
use log::debug;
use tokio::task::JoinHandle;

use super::service::RequestService;
use super::services::{ContentService, CustomService, JsonService};
use super::types::{RequestDescriptor, ResponseEnvelope};
use crate::core::error::NavigationError;
use crate::core::state::AppState;
use crate::platform::ContentLoader;

/// A started request. Join positionally, never by completion order.
pub type RequestTask = JoinHandle<Result<ResponseEnvelope, NavigationError>>;

/// Maps each descriptor kind to the service that executes it.
pub struct RequestDispatcher {
    json: Arc<dyn RequestService>,
    content: Arc<dyn RequestService>,
    custom: Arc<dyn RequestService>,
}

impl RequestDispatcher {
    pub fn new(client: reqwest::Client, loader: Arc<dyn ContentLoader>) -> Self {
        Self {
            json: Arc::new(JsonService::new(client)),
            content: Arc::new(ContentService::new(loader)),
            custom: Arc::new(CustomService::new()),
        }
    }

    /// Replaces the service for JSON requests.
    pub fn with_json(mut self, service: Arc<dyn RequestService>) -> Self {
        self.json = service;
        self
    }

    fn service_for(&self, descriptor: &RequestDescriptor) -> Option<&Arc<dyn RequestService>> {
        match descriptor {
            RequestDescriptor::Json(_) => Some(&self.json),
            RequestDescriptor::Content(_) | RequestDescriptor::Image(_) => Some(&self.content),
            RequestDescriptor::Custom(_) => Some(&self.custom),
            RequestDescriptor::Cluster(_) | RequestDescriptor::Unsupported => None,
        }
    }

    /// Starts every request declared for `name`, in declaration order.
    ///
    /// A missing route or an empty request list yields no tasks. Kinds without
    /// a service are skipped.
    pub fn build_requests(&self, state: &AppState, name: &str) -> Vec<RequestTask> {
        let Some(route) = state.config.route(name) else {
            debug!("No routing entry for '{}'", name);
            return Vec::new();
        };

        let mut tasks = Vec::with_capacity(route.requests.len());
        for descriptor in &route.requests {
            let Some(service) = self.service_for(descriptor) else {
                debug!("Skipping {} request: no service", descriptor.kind());
                continue;
            };

            let service = Arc::clone(service);
            let state = state.clone();
            let descriptor = descriptor.clone();
            tasks.push(tokio::spawn(async move {
                service.execute(&state, &descriptor).await
            }));
        }
        tasks
    }
}

/// Waits for every task, returning envelopes in the order the tasks were given.
/// The first failure aborts the join; tasks still running are left to finish.
pub async fn join(tasks: Vec<RequestTask>) -> Result<Vec<ResponseEnvelope>, NavigationError> {
    try_join_all(tasks.into_iter().map(|task| async move {
        task.await
            .unwrap_or_else(|e| Err(NavigationError::from(e)))
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{DelayedJson, StaticLoader, test_state};
    use serde_json::json;

    fn dispatcher(delays: &[(&str, u64)]) -> RequestDispatcher {
        RequestDispatcher::new(
            reqwest::Client::new(),
            Arc::new(StaticLoader::with_symbols(&[])),
        )
        .with_json(Arc::new(DelayedJson::new(delays)))
    }

    #[tokio::test]
    async fn test_missing_route_and_empty_requests_yield_nothing() {
        let state = test_state(json!({"routing": {"empty": {"requests": []}}}));
        let dispatcher = dispatcher(&[]);
        assert!(dispatcher.build_requests(&state, "missing").is_empty());
        assert!(dispatcher.build_requests(&state, "empty").is_empty());
        assert_eq!(join(Vec::new()).await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_unsupported_kinds_are_skipped() {
        let state = test_state(json!({"routing": {"top": {"requests": [
            {"type": "cluster", "path": "/c"},
            {"type": "video", "path": "/v"},
            {"type": "json", "name": "a", "path": "/a"}
        ]}}}));
        let tasks = dispatcher(&[]).build_requests(&state, "top");
        assert_eq!(tasks.len(), 1);

        let envelopes = join(tasks).await.unwrap();
        assert_eq!(envelopes[0].name, "a");
    }

    #[tokio::test]
    async fn test_results_follow_declaration_order() {
        let state = test_state(json!({"routing": {"top": {"requests": [
            {"type": "json", "name": "slow", "path": "/slow"},
            {"type": "json", "name": "fast", "path": "/fast"},
            {"type": "custom", "name": "custom", "class": "x", "method": "y"}
        ]}}}));
        let tasks = dispatcher(&[("/slow", 50), ("/fast", 0)]).build_requests(&state, "top");

        let names: Vec<String> = join(tasks).await.unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["slow", "fast", "custom"]);
    }

    #[tokio::test]
    async fn test_single_failure_rejects_join() {
        let state = test_state(json!({"routing": {"top": {"requests": [
            {"type": "json", "name": "ok", "path": "/ok"},
            {"type": "json", "name": "bad", "path": "/fail"}
        ]}}}));
        let tasks = dispatcher(&[]).build_requests(&state, "top");
        let err = join(tasks).await.unwrap_err();
        assert!(err.is_transport());
    }
}
