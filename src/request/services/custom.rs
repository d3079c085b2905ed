//! Custom requests: an in-process call to a registered package.
//!
//! `class`, `access` and `method` all go through the template parser.
//! `access = "static"` calls the package's shared instance, anything else a
//! freshly constructed one. An unregistered class resolves to `null`.

use async_trait::async_trait;
use log::{debug, info};
use serde_json::Value;

use crate::core::error::NavigationError;
use crate::core::state::AppState;
use crate::request::service::{RequestService, mismatch};
use crate::request::{Payload, RequestDescriptor};

#[derive(Debug, Default)]
pub struct CustomService;

impl CustomService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RequestService for CustomService {
    fn name(&self) -> &str {
        "custom"
    }

    async fn fetch(
        &self,
        state: &AppState,
        descriptor: &RequestDescriptor,
    ) -> Result<Payload, NavigationError> {
        let RequestDescriptor::Custom(request) = descriptor else {
            return Err(mismatch(self.name(), descriptor));
        };

        let parser = state.parser();
        let class = parser.execute(&request.class);
        let access = parser.execute(&request.access);
        let method = parser.execute(&request.method);

        let Some(entry) = state.packages.get(&class) else {
            debug!("Custom class '{}' is not registered, resolving null", class);
            return Ok(Payload::json(Value::Null));
        };

        info!("Custom request: {}::{} ({})", class, method, access);

        let result = if access == "static" {
            let statics = entry.statics().ok_or_else(|| {
                NavigationError::Config(format!("'{class}' has no static access"))
            })?;
            statics.call(&method).await
        } else {
            entry.instantiate().call(&method).await
        };

        result
            .map(Payload::json)
            .map_err(|e| NavigationError::Package {
                name: class,
                message: e.to_string(),
            })
    }
}
