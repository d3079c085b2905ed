//! # Query Resolver
//!
//! Turns an explicit view name, or the current location, into a canonical
//! view name plus query string, and rebuilds the query map from it.
//!
//! ```text
//! explicit name ─┐
//!                ├─► parse() ─► Resolution { name, query_string, params }
//! location ──────┘                  │
//!                                   └─► resolve(): QueryMap cleared + refilled
//! ```
//!
//! Parameters are split on `&` then `=` and stored undecoded. A parameter
//! without `=` maps to an empty string.

use std::collections::HashMap;

use crate::core::config::{DEFAULT_VIEW, RouteEntry};
use crate::core::store::QueryMap;
use crate::platform::Location;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub name: String,
    /// Canonical query string including the leading `?`, or empty.
    pub query_string: String,
    /// Parameters in the order they were applied; later keys win.
    pub params: Vec<(String, String)>,
}

fn parse_params(query: &str, params: &mut Vec<(String, String)>) {
    for parameter in query.split('&') {
        let mut pair = parameter.split('=');
        let key = pair.next().unwrap_or_default();
        let value = pair.next().unwrap_or_default();
        params.push((key.to_string(), value.to_string()));
    }
}

/// Side-effect free resolution.
pub fn parse(
    explicit: Option<&str>,
    location: &Location,
    routing: &HashMap<String, RouteEntry>,
) -> Resolution {
    let mut name = explicit.unwrap_or_default().to_string();
    let mut query_string = String::new();
    let mut params = Vec::new();

    if name.is_empty() && !location.search.is_empty() {
        query_string = location.search.clone();
        parse_params(query_string.trim_start_matches('?'), &mut params);
    }

    if name.is_empty() {
        name = location
            .pathname
            .strip_prefix('/')
            .unwrap_or(&location.pathname)
            .to_string();

        if !name.is_empty() {
            name = match routing.get(&name) {
                None => DEFAULT_VIEW.to_string(),
                Some(route) if route.private => route
                    .redirect
                    .clone()
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| DEFAULT_VIEW.to_string()),
                Some(_) => name,
            };
        }

        if name.is_empty() {
            name = DEFAULT_VIEW.to_string();
        }
    }

    if let Some((base, inline)) = name.split_once('?') {
        let inline = inline.split('?').next().unwrap_or_default();
        parse_params(inline, &mut params);
        query_string = format!("?{inline}");
        name = base.to_string();
    }

    if name.starts_with('.') {
        let rest = name.split('/').skip(1).collect::<Vec<_>>().join("/");
        name = if rest.is_empty() {
            DEFAULT_VIEW.to_string()
        } else {
            rest
        };
    }

    // Only the first marker is removed
    if name.contains('@') {
        name = name.replacen('@', "", 1);
    }

    Resolution {
        name,
        query_string,
        params,
    }
}

/// Clears `query`, resolves, and fills `query` with the resolved parameters.
pub fn resolve(
    query: &QueryMap,
    explicit: Option<&str>,
    location: &Location,
    routing: &HashMap<String, RouteEntry>,
) -> Resolution {
    query.clear();
    let resolution = parse(explicit, location, routing);
    for (key, value) in &resolution.params {
        query.set(key.clone(), value.clone());
    }
    resolution
}
