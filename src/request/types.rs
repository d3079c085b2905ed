use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Descriptors (read from the routing configuration)
// ============================================================================

/// One or more registered package names. A bare string is a single callback.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Callbacks {
    One(String),
    Many(Vec<String>),
}

impl Callbacks {
    /// Normalizes to a list of names, dropping empty entries.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Callbacks::One(name) => vec![name.as_str()],
            Callbacks::Many(names) => names.iter().map(String::as_str).collect(),
        }
        .into_iter()
        .filter(|name| !name.is_empty())
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }
}

impl From<&str> for Callbacks {
    fn from(name: &str) -> Self {
        Callbacks::One(name.to_string())
    }
}

/// Fields shared by every transport-backed descriptor (json, content, image, cluster).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HttpRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub cache: bool,
    #[serde(default)]
    pub callback: Option<Callbacks>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl HttpRequest {
    /// Upper-cased method, defaulting to GET.
    pub fn http_method(&self) -> String {
        self.method
            .as_deref()
            .map(str::to_uppercase)
            .unwrap_or_else(|| "GET".to_string())
    }

    /// The body is only sent for POST and PUT.
    pub fn sends_body(&self) -> bool {
        self.body.is_some() && matches!(self.http_method().as_str(), "POST" | "PUT")
    }
}

/// An in-process call to a registered package.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CustomRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cache: bool,
    #[serde(default)]
    pub callback: Option<Callbacks>,
    pub class: String,
    #[serde(default)]
    pub access: String,
    pub method: String,
}

/// A single declarative request from a view's routing entry.
///
/// Tagged by the `type` field. Types without a service (`cluster`) and
/// unknown types are kept so the dispatcher can skip them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RequestDescriptor {
    Json(HttpRequest),
    Content(HttpRequest),
    Image(HttpRequest),
    Cluster(HttpRequest),
    Custom(CustomRequest),
    #[serde(other)]
    Unsupported,
}

impl RequestDescriptor {
    /// The `type` tag as written in configuration.
    pub fn kind(&self) -> &'static str {
        match self {
            RequestDescriptor::Json(_) => "json",
            RequestDescriptor::Content(_) => "content",
            RequestDescriptor::Image(_) => "image",
            RequestDescriptor::Cluster(_) => "cluster",
            RequestDescriptor::Custom(_) => "custom",
            RequestDescriptor::Unsupported => "unsupported",
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            RequestDescriptor::Json(r)
            | RequestDescriptor::Content(r)
            | RequestDescriptor::Image(r)
            | RequestDescriptor::Cluster(r) => r.name.as_deref(),
            RequestDescriptor::Custom(r) => r.name.as_deref(),
            RequestDescriptor::Unsupported => None,
        }
        .filter(|name| !name.is_empty())
    }

    pub fn cache(&self) -> bool {
        match self {
            RequestDescriptor::Json(r)
            | RequestDescriptor::Content(r)
            | RequestDescriptor::Image(r)
            | RequestDescriptor::Cluster(r) => r.cache,
            RequestDescriptor::Custom(r) => r.cache,
            RequestDescriptor::Unsupported => false,
        }
    }

    pub fn callback(&self) -> Option<&Callbacks> {
        match self {
            RequestDescriptor::Json(r)
            | RequestDescriptor::Content(r)
            | RequestDescriptor::Image(r)
            | RequestDescriptor::Cluster(r) => r.callback.as_ref(),
            RequestDescriptor::Custom(r) => r.callback.as_ref(),
            RequestDescriptor::Unsupported => None,
        }
    }

    /// Content-backed descriptors register symbols that must be released on cleanup.
    pub fn registers_symbols(&self) -> bool {
        matches!(
            self,
            RequestDescriptor::Content(_) | RequestDescriptor::Image(_)
        )
    }
}

// ============================================================================
// Results
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Structured display bundle carrying named symbols.
    Bundle,
    Image,
}

/// Bookkeeping shared by every symbol harvested from one loaded resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoaderInfo {
    pub url: String,
    /// Fully qualified symbol names as declared by the bundle.
    pub symbols: Vec<String>,
}

impl LoaderInfo {
    /// Index keys: the last `.`-separated segment of each symbol.
    pub fn symbol_keys(&self) -> impl Iterator<Item = &str> {
        self.symbols
            .iter()
            .filter_map(|symbol| symbol.rsplit('.').next())
    }
}

/// Loaded binary/display content.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub kind: ContentKind,
    pub bytes: Vec<u8>,
    /// Parsed bundle document, `None` for images.
    pub data: Option<Value>,
    pub loader_info: Arc<LoaderInfo>,
}

/// Handle to a view activated by the display collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewHandle {
    pub name: String,
    pub id: String,
}

/// Any value a request, callback, or view activation can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Arc<Value>),
    Content(Arc<Content>),
    View(ViewHandle),
}

impl Payload {
    pub fn json(value: Value) -> Self {
        Payload::Json(Arc::new(value))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_content(&self) -> Option<&Arc<Content>> {
        match self {
            Payload::Content(content) => Some(content),
            _ => None,
        }
    }

    /// A JSON summary suitable for printing.
    pub fn to_json(&self) -> Value {
        match self {
            Payload::Json(value) => value.as_ref().clone(),
            Payload::Content(content) => serde_json::json!({
                "kind": content.kind,
                "url": content.loader_info.url,
                "bytes": content.bytes.len(),
                "symbols": content.loader_info.symbols,
            }),
            Payload::View(view) => serde_json::json!({ "view": view.name, "id": view.id }),
        }
    }
}

/// Uniform result of executing one descriptor. An empty name means "do not store".
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub name: String,
    pub response: Payload,
}

impl ResponseEnvelope {
    pub fn new(name: impl Into<String>, response: Payload) -> Self {
        Self {
            name: name.into(),
            response,
        }
    }
}
