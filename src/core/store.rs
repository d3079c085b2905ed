//! # Named Stores
//!
//! Shared name → value mappings used across a running application:
//!
//! ```text
//! ResponseCache  name → Payload          persists across navigations
//! ResponseStore  name → Payload          current view's responses
//! QueryMap       param → value           rebuilt every navigation
//! SymbolIndex    symbol → LoaderInfo     populated by content loads
//! ```
//!
//! Handles are cheap to clone and all clones see the same map. Writes are
//! last-writer-wins; locks are never held across an await point.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::request::{LoaderInfo, Payload};

pub type ResponseCache = NamedStore<Payload>;
pub type ResponseStore = NamedStore<Payload>;
pub type QueryMap = NamedStore<String>;
pub type SymbolIndex = NamedStore<Arc<LoaderInfo>>;

#[derive(Debug)]
pub struct NamedStore<V> {
    inner: Arc<RwLock<HashMap<String, V>>>,
}

impl<V> Clone for NamedStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for NamedStore<V> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<V: Clone> NamedStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, V>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, V>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, name: &str) -> Option<V> {
        self.read().get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Inserts or overwrites, returning the previous value.
    pub fn set(&self, name: impl Into<String>, value: V) -> Option<V> {
        self.write().insert(name.into(), value)
    }

    pub fn remove(&self, name: &str) -> Option<V> {
        self.write().remove(name)
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Sorted keys, for stable logging and output.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Point-in-time copy of the whole map.
    pub fn snapshot(&self) -> HashMap<String, V> {
        self.read().clone()
    }
}
