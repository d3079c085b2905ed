//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::core::config::AppConfig;
use crate::core::error::NavigationError;
use crate::core::navigator::Platform;
use crate::core::package::{Package, PackageError, PackageRegistry};
use crate::core::state::AppState;
use crate::core::store::ResponseStore;
use crate::platform::{
    ContentLoader, Display, HeadlessDisplay, LoadRequest, LogLoading, MemoryHistory,
};
use crate::request::{
    Content, ContentKind, LoaderInfo, Payload, RequestDescriptor, RequestService, ViewHandle,
};

// ============================================================================
// State
// ============================================================================

/// Builds state from a JSON config with no packages registered.
pub fn test_state(config: Value) -> AppState {
    test_state_with(config, PackageRegistry::new())
}

pub fn test_state_with(config: Value, packages: PackageRegistry) -> AppState {
    let config: AppConfig = serde_json::from_value(config).expect("valid test config");
    AppState::new(config, packages)
}

// ============================================================================
// Packages
// ============================================================================

/// Returns the value it was called with.
pub struct Echo;

#[async_trait]
impl Package for Echo {
    async fn execute(&self, value: Payload) -> Result<Value, PackageError> {
        Ok(value.to_json())
    }
}

/// Appends a suffix to a string value.
pub struct Suffix(pub &'static str);

#[async_trait]
impl Package for Suffix {
    async fn execute(&self, value: Payload) -> Result<Value, PackageError> {
        let text = value.to_json().as_str().unwrap_or_default().to_string();
        Ok(json!(format!("{}{}", text, self.0)))
    }
}

pub struct Failing;

#[async_trait]
impl Package for Failing {
    async fn execute(&self, _value: Payload) -> Result<Value, PackageError> {
        Err(PackageError("boom".into()))
    }
}

/// `hello` bumps a counter, `count` reads it.
#[derive(Default)]
pub struct Greeter {
    hellos: AtomicUsize,
}

#[async_trait]
impl Package for Greeter {
    async fn call(&self, method: &str) -> Result<Value, PackageError> {
        match method {
            "hello" => {
                self.hellos.fetch_add(1, Ordering::SeqCst);
                Ok(json!("hello"))
            }
            "count" => Ok(json!(self.hellos.load(Ordering::SeqCst))),
            other => Err(PackageError(format!("no method '{other}'"))),
        }
    }
}

/// Records every value it receives. Clones share the record.
#[derive(Clone, Default)]
pub struct Recorder {
    values: Arc<Mutex<Vec<Value>>>,
}

impl Recorder {
    pub fn values(&self) -> Vec<Value> {
        self.values.lock().unwrap().clone()
    }
}

#[async_trait]
impl Package for Recorder {
    async fn execute(&self, value: Payload) -> Result<Value, PackageError> {
        let value = value.to_json();
        self.values.lock().unwrap().push(value.clone());
        Ok(value)
    }
}

// ============================================================================
// Services and loaders
// ============================================================================

/// JSON service stand-in: answers `{"path": ...}` after a per-path delay.
/// `/fail` answers HTTP 500. Counts fetches.
pub struct DelayedJson {
    delays: HashMap<String, u64>,
    fetches: AtomicUsize,
}

impl DelayedJson {
    pub fn new(delays: &[(&str, u64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|(path, ms)| (path.to_string(), *ms))
                .collect(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestService for DelayedJson {
    fn name(&self) -> &str {
        "json"
    }

    async fn fetch(
        &self,
        state: &AppState,
        descriptor: &RequestDescriptor,
    ) -> Result<Payload, NavigationError> {
        let RequestDescriptor::Json(request) = descriptor else {
            return Err(NavigationError::Config("not json".into()));
        };
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let path = state.parser().execute(&request.path);
        if let Some(ms) = self.delays.get(&path) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        if path == "/fail" {
            return Err(NavigationError::Api {
                status: 500,
                message: "failed".into(),
            });
        }
        Ok(Payload::json(json!({ "path": path })))
    }
}

/// Content loader that never touches the network. Keeps every request it saw.
pub struct StaticLoader {
    symbols: Vec<String>,
    requests: Mutex<Vec<LoadRequest>>,
}

impl StaticLoader {
    pub fn with_symbols(symbols: &[&str]) -> Self {
        Self {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<LoadRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentLoader for StaticLoader {
    async fn load(&self, request: &LoadRequest) -> Result<Content, NavigationError> {
        self.requests.lock().unwrap().push(request.clone());
        let symbols = match request.kind {
            ContentKind::Bundle => self.symbols.clone(),
            ContentKind::Image => Vec::new(),
        };
        Ok(Content {
            kind: request.kind,
            bytes: Vec::new(),
            data: None,
            loader_info: Arc::new(LoaderInfo {
                url: request.url.clone(),
                symbols,
            }),
        })
    }
}

/// Display whose snapshot always fails.
pub struct FailingDisplay;

#[async_trait]
impl Display for FailingDisplay {
    async fn capture(&self) -> Result<(), NavigationError> {
        Err(NavigationError::Config("no display tree".into()))
    }

    async fn add_child(
        &self,
        _name: &str,
        _responses: &ResponseStore,
    ) -> Result<Option<ViewHandle>, NavigationError> {
        Ok(None)
    }
}

// ============================================================================
// Platform
// ============================================================================

/// Headless collaborators, kept as concrete types so tests can inspect them.
pub struct TestPlatform {
    pub history: Arc<MemoryHistory>,
    pub display: Arc<HeadlessDisplay>,
    pub loading: Arc<LogLoading>,
    pub loader: Arc<StaticLoader>,
}

impl TestPlatform {
    pub fn platform(&self) -> Platform {
        Platform {
            display: self.display.clone(),
            loading: self.loading.clone(),
            history: self.history.clone(),
            loader: self.loader.clone(),
        }
    }
}

/// Every routed view is displayable; location starts at `initial`.
pub fn test_platform(state: &AppState, initial: &str) -> TestPlatform {
    TestPlatform {
        history: Arc::new(MemoryHistory::new("https://example.com", initial)),
        display: Arc::new(HeadlessDisplay::new(
            state.config.stage,
            state.config.routing.keys().cloned(),
        )),
        loading: Arc::new(LogLoading::new()),
        loader: Arc::new(StaticLoader::with_symbols(&[])),
    }
}
