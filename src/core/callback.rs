//! # Callback Executor
//!
//! Runs the packages named by a `callback` field against a value. Every
//! registered name gets a fresh instance; all of them run concurrently and
//! the results come back in declaration order. Unregistered names are
//! skipped, never an error.

use futures::future::try_join_all;
use log::debug;
use serde_json::Value;

use crate::core::error::NavigationError;
use crate::core::package::PackageRegistry;
use crate::request::{Callbacks, Payload};

/// Returns `None` without touching the registry when there is nothing to run.
pub async fn execute(
    packages: &PackageRegistry,
    callbacks: Option<&Callbacks>,
    value: &Payload,
) -> Result<Option<Vec<Value>>, NavigationError> {
    let Some(callbacks) = callbacks.filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    let mut invocations = Vec::new();
    for name in callbacks.names() {
        let Some(entry) = packages.get(name) else {
            debug!("Callback '{}' is not registered, skipping", name);
            continue;
        };

        let instance = entry.instantiate();
        let value = value.clone();
        invocations.push(async move {
            instance
                .execute(value)
                .await
                .map_err(|e| NavigationError::Package {
                    name: name.to_string(),
                    message: e.to_string(),
                })
        });
    }

    debug!("Running {} callback(s)", invocations.len());
    try_join_all(invocations).await.map(Some)
}
