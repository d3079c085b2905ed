//! In-memory platform: a history stack with back/forward, a display that
//! records what it was asked to do, and an overlay that only logs.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use reqwest::Url;
use serde::Serialize;

use super::{Display, History, Loading, Location};
use crate::core::config::StageConfig;
use crate::core::error::NavigationError;
use crate::core::store::ResponseStore;
use crate::request::ViewHandle;

// ============================================================================
// History
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub url: String,
    pub pushed_at: DateTime<Utc>,
}

#[derive(Debug)]
struct HistoryStack {
    entries: Vec<HistoryEntry>,
    index: usize,
}

/// Session history kept in memory. The current entry is the location.
#[derive(Debug)]
pub struct MemoryHistory {
    origin: String,
    stack: RwLock<HistoryStack>,
}

impl MemoryHistory {
    /// `origin` like `https://example.com`, `initial` a path such as `/products?page=2`.
    pub fn new(origin: &str, initial: &str) -> Self {
        let origin = origin.trim_end_matches('/').to_string();
        let url = format!("{}/{}", origin, initial.trim_start_matches('/'));
        Self {
            origin,
            stack: RwLock::new(HistoryStack {
                entries: vec![HistoryEntry {
                    url,
                    pushed_at: Utc::now(),
                }],
                index: 0,
            }),
        }
    }

    /// Number of entries in the session history.
    pub fn len(&self) -> usize {
        self.stack
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.stack
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clone()
    }

    pub fn current_url(&self) -> String {
        let stack = self.stack.read().unwrap_or_else(PoisonError::into_inner);
        stack.entries[stack.index].url.clone()
    }

    /// Moves one entry back. Returns false at the start of history.
    pub fn back(&self) -> bool {
        let mut stack = self.stack.write().unwrap_or_else(PoisonError::into_inner);
        if stack.index == 0 {
            return false;
        }
        stack.index -= 1;
        debug!("history back -> {}", stack.entries[stack.index].url);
        true
    }

    /// Moves one entry forward. Returns false at the end of history.
    pub fn forward(&self) -> bool {
        let mut stack = self.stack.write().unwrap_or_else(PoisonError::into_inner);
        if stack.index + 1 >= stack.entries.len() {
            return false;
        }
        stack.index += 1;
        debug!("history forward -> {}", stack.entries[stack.index].url);
        true
    }
}

impl History for MemoryHistory {
    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn location(&self) -> Location {
        let url = self.current_url();
        match Url::parse(&url) {
            Ok(parsed) => Location {
                pathname: parsed.path().to_string(),
                search: parsed.query().map(|q| format!("?{q}")).unwrap_or_default(),
            },
            Err(e) => {
                warn!("Unparseable history URL {}: {}", url, e);
                Location::default()
            }
        }
    }

    fn push_state(&self, url: &str) {
        let mut stack = self.stack.write().unwrap_or_else(PoisonError::into_inner);
        let keep = stack.index + 1;
        stack.entries.truncate(keep);
        stack.entries.push(HistoryEntry {
            url: url.to_string(),
            pushed_at: Utc::now(),
        });
        stack.index = stack.entries.len() - 1;
        debug!("history push -> {}", url);
    }
}

// ============================================================================
// Display
// ============================================================================

/// Activates a view for every routed name and remembers the sequence.
#[derive(Debug)]
pub struct HeadlessDisplay {
    stage: StageConfig,
    views: HashSet<String>,
    activated: RwLock<Vec<ViewHandle>>,
    snapshots: AtomicUsize,
}

impl HeadlessDisplay {
    pub fn new(stage: StageConfig, views: impl IntoIterator<Item = String>) -> Self {
        Self {
            stage,
            views: views.into_iter().collect(),
            activated: RwLock::new(Vec::new()),
            snapshots: AtomicUsize::new(0),
        }
    }

    pub fn activated(&self) -> Vec<ViewHandle> {
        self.activated
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Display for HeadlessDisplay {
    async fn capture(&self) -> Result<(), NavigationError> {
        let count = self.snapshots.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "snapshot #{} captured ({}x{})",
            count, self.stage.width, self.stage.height
        );
        Ok(())
    }

    async fn add_child(
        &self,
        name: &str,
        responses: &ResponseStore,
    ) -> Result<Option<ViewHandle>, NavigationError> {
        if !self.views.contains(name) {
            debug!("no view declared for '{}'", name);
            return Ok(None);
        }

        let view = ViewHandle {
            name: name.to_string(),
            id: uuid::Uuid::new_v4().to_string(),
        };
        info!(
            "view '{}' activated with responses {:?}",
            name,
            responses.keys()
        );
        self.activated
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(view.clone());
        Ok(Some(view))
    }
}

// ============================================================================
// Loading overlay
// ============================================================================

/// Overlay that logs and counts how many times it is showing.
#[derive(Debug, Default)]
pub struct LogLoading {
    active: AtomicUsize,
    started: AtomicUsize,
}

impl LogLoading {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlays currently shown.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Total number of `start()` calls.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Loading for LogLoading {
    async fn start(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_add(1, Ordering::SeqCst);
        info!("loading started");
    }

    async fn end(&self) {
        let _ = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        info!("loading ended");
    }
}
