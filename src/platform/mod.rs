//! # Platform Collaborators
//!
//! The narrow contracts the navigator drives but does not implement:
//! display/context, loading overlay, browser history, and content loading.
//! `headless` provides in-memory versions for the CLI and tests.

pub mod headless;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::core::error::NavigationError;
use crate::core::store::ResponseStore;
use crate::request::{Content, ContentKind, ViewHandle};

pub use headless::{HeadlessDisplay, LogLoading, MemoryHistory};

/// The readable part of the browser location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Path including the leading `/`.
    pub pathname: String,
    /// Query string including the leading `?`, or empty.
    pub search: String,
}

/// Display tree / view context.
#[async_trait]
pub trait Display: Send + Sync {
    /// Captures the current display tree into a snapshot shown while loading.
    async fn capture(&self) -> Result<(), NavigationError>;

    /// Builds and activates the view for `name`. `None` when no view is declared.
    async fn add_child(
        &self,
        name: &str,
        responses: &ResponseStore,
    ) -> Result<Option<ViewHandle>, NavigationError>;
}

/// Loading overlay.
#[async_trait]
pub trait Loading: Send + Sync {
    async fn start(&self);
    async fn end(&self);
}

/// Browser history and location.
pub trait History: Send + Sync {
    fn origin(&self) -> String;
    fn location(&self) -> Location;
    fn push_state(&self, url: &str);
}

/// Everything the content loader needs to fetch one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    /// JSON-encoded body, if the descriptor declared one.
    pub body: Option<String>,
    pub kind: ContentKind,
}

/// Binary/display content loader. Errors surface as `NavigationError::Load`.
#[async_trait]
pub trait ContentLoader: Send + Sync {
    async fn load(&self, request: &LoadRequest) -> Result<Content, NavigationError>;
}
