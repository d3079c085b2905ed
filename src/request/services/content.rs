//! Content and image requests.
//!
//! Loading goes through a [`ContentLoader`]. Once loaded, every symbol the
//! content declares is indexed against its loader info so views can look
//! symbols up by their short name.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Method;
use serde_json::Value;

use crate::core::error::NavigationError;
use crate::core::state::AppState;
use crate::platform::{ContentLoader, LoadRequest};
use crate::request::service::{RequestService, mismatch};
use crate::request::{Content, ContentKind, LoaderInfo, Payload, RequestDescriptor};

pub struct ContentService {
    loader: Arc<dyn ContentLoader>,
}

impl ContentService {
    pub fn new(loader: Arc<dyn ContentLoader>) -> Self {
        Self { loader }
    }
}

#[async_trait]
impl RequestService for ContentService {
    fn name(&self) -> &str {
        "content"
    }

    async fn fetch(
        &self,
        state: &AppState,
        descriptor: &RequestDescriptor,
    ) -> Result<Payload, NavigationError> {
        let (request, kind) = match descriptor {
            RequestDescriptor::Content(r) => (r, ContentKind::Bundle),
            RequestDescriptor::Image(r) => (r, ContentKind::Image),
            _ => return Err(mismatch(self.name(), descriptor)),
        };

        let load = LoadRequest {
            url: state.parser().execute(&request.path),
            method: request.http_method(),
            headers: request.headers.clone(),
            body: request
                .body
                .as_ref()
                .filter(|_| request.sends_body())
                .map(Value::to_string),
            kind,
        };

        let content = self.loader.load(&load).await?;
        index_symbols(state, &content.loader_info);

        Ok(Payload::Content(Arc::new(content)))
    }

    fn on_cached(&self, state: &AppState, cached: &Payload) {
        if let Some(content) = cached.as_content() {
            index_symbols(state, &content.loader_info);
        }
    }
}

fn index_symbols(state: &AppState, info: &Arc<LoaderInfo>) {
    for key in info.symbol_keys() {
        state.symbols.set(key.to_string(), Arc::clone(info));
    }
    debug!("Indexed {} symbol(s) from {}", info.symbols.len(), info.url);
}

// ============================================================================
// HTTP loader
// ============================================================================

/// Loads content over HTTP. Bundles are JSON documents whose `symbols`
/// object lists the named symbols they export; images are kept as bytes.
pub struct HttpContentLoader {
    client: reqwest::Client,
}

impl HttpContentLoader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpContentLoader {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

fn load_error(url: &str, message: impl ToString) -> NavigationError {
    NavigationError::Load {
        url: url.to_string(),
        message: message.to_string(),
    }
}

/// Symbol names declared by a bundle document, in key order.
fn bundle_symbols(data: &Value) -> Vec<String> {
    match data.get("symbols") {
        Some(Value::Object(symbols)) => symbols.keys().cloned().collect(),
        Some(Value::Array(symbols)) => symbols
            .iter()
            .filter_map(|entry| match entry {
                Value::String(name) => Some(name.clone()),
                Value::Array(pair) => pair.first().and_then(Value::as_str).map(String::from),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl ContentLoader for HttpContentLoader {
    async fn load(&self, request: &LoadRequest) -> Result<Content, NavigationError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| NavigationError::Config(format!("invalid method: {e}")))?;

        info!("Content load ({:?}): {} {}", request.kind, method, request.url);

        let mut builder = self.client.request(method, &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| load_error(&request.url, e))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Content load {} failed: {}", request.url, status);
            return Err(load_error(&request.url, format!("HTTP {}", status.as_u16())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| load_error(&request.url, e))?
            .to_vec();

        let (data, symbols) = match request.kind {
            ContentKind::Image => (None, Vec::new()),
            ContentKind::Bundle => {
                let data: Value =
                    serde_json::from_slice(&bytes).map_err(|e| load_error(&request.url, e))?;
                let symbols = bundle_symbols(&data);
                (Some(data), symbols)
            }
        };

        Ok(Content {
            kind: request.kind,
            bytes,
            data,
            loader_info: Arc::new(LoaderInfo {
                url: request.url.clone(),
                symbols,
            }),
        })
    }
}
