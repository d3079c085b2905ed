//! JSON requests over HTTP.
//!
//! `{{key}}` placeholders in the path are expanded from configuration.
//! Method defaults to GET; the body is only sent for POST and PUT.
//! Any non-2xx status rejects the request.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Method;
use serde_json::Value;

use crate::core::error::NavigationError;
use crate::core::state::AppState;
use crate::request::service::{RequestService, mismatch};
use crate::request::{Payload, RequestDescriptor};

pub struct JsonService {
    client: reqwest::Client,
}

impl JsonService {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for JsonService {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl RequestService for JsonService {
    fn name(&self) -> &str {
        "json"
    }

    async fn fetch(
        &self,
        state: &AppState,
        descriptor: &RequestDescriptor,
    ) -> Result<Payload, NavigationError> {
        let RequestDescriptor::Json(request) = descriptor else {
            return Err(mismatch(self.name(), descriptor));
        };

        let url = state.parser().execute(&request.path);
        let method = Method::from_bytes(request.http_method().as_bytes())
            .map_err(|e| NavigationError::Config(format!("invalid method: {e}")))?;

        info!("JSON request: {} {}", method, url);

        let mut builder = self.client.request(method, &url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if request.sends_body()
            && let Some(body) = &request.body
        {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| NavigationError::Network(e.to_string()))?;

        debug!("JSON response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("JSON request {} failed: {} - {}", url, status, message);
            return Err(NavigationError::Api { status, message });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| NavigationError::Parse(e.to_string()))?;

        Ok(Payload::json(data))
    }
}
