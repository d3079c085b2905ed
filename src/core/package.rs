//! # Package Registry
//!
//! Late-bound handlers looked up by symbolic name. Callbacks and custom
//! requests name a package in configuration; the registry turns that name
//! into a fresh handler instance (or the package's shared "static" one).
//!
//! ```text
//! "app.callback.Loaded" ──► PackageEntry ──► factory() ──► Box<dyn Package>
//!                                        └─► statics   ──► Arc<dyn Package>
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::request::Payload;

/// Error returned by a package. The registry name is attached by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageError(pub String);

impl fmt::Display for PackageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for PackageError {}

#[async_trait]
pub trait Package: Send + Sync {
    /// Callback entry point: receives a response or an activated view.
    async fn execute(&self, _value: Payload) -> Result<Value, PackageError> {
        Err(PackageError("package does not handle callbacks".into()))
    }

    /// Named method invoked by custom requests.
    async fn call(&self, method: &str) -> Result<Value, PackageError> {
        Err(PackageError(format!("no method '{method}'")))
    }
}

pub type PackageFactory = Arc<dyn Fn() -> Box<dyn Package> + Send + Sync>;

#[derive(Clone)]
pub struct PackageEntry {
    factory: PackageFactory,
    statics: Option<Arc<dyn Package>>,
}

impl PackageEntry {
    /// Constructs a new instance with no arguments.
    pub fn instantiate(&self) -> Box<dyn Package> {
        (self.factory)()
    }

    pub fn statics(&self) -> Option<&Arc<dyn Package>> {
        self.statics.as_ref()
    }
}

/// Read-only name → package table, built once at startup.
#[derive(Clone, Default)]
pub struct PackageRegistry {
    entries: HashMap<String, PackageEntry>,
}

impl fmt::Debug for PackageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("PackageRegistry").field("names", &names).finish()
    }
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructible package. Re-registering a name replaces it.
    pub fn register<F, P>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: Package + 'static,
    {
        let name = name.into();
        let statics = self.entries.remove(&name).and_then(|e| e.statics);
        self.entries.insert(
            name,
            PackageEntry {
                factory: Arc::new(move || Box::new(factory()) as Box<dyn Package>),
                statics,
            },
        );
        self
    }

    /// Registers the shared instance used for `access = "static"` calls.
    /// Also constructible: every instance is a handle to the same value.
    pub fn register_static<P>(&mut self, name: impl Into<String>, package: P) -> &mut Self
    where
        P: Package + 'static,
    {
        let shared: Arc<dyn Package> = Arc::new(package);
        let for_factory = Arc::clone(&shared);
        self.entries.insert(
            name.into(),
            PackageEntry {
                factory: Arc::new(move || Box::new(Shared(Arc::clone(&for_factory))) as Box<dyn Package>),
                statics: Some(shared),
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&PackageEntry> {
        self.entries.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Instance view of a static package.
struct Shared(Arc<dyn Package>);

#[async_trait]
impl Package for Shared {
    async fn execute(&self, value: Payload) -> Result<Value, PackageError> {
        self.0.execute(value).await
    }

    async fn call(&self, method: &str) -> Result<Value, PackageError> {
        self.0.call(method).await
    }
}
