//! # Navigator
//!
//! Runs one navigation as a strictly sequential transaction:
//!
//! ```text
//! Idle → Loading → CleaningPrevious → Resolving → Dispatching
//!      → Aggregating → Activating → Callback → Idle
//! ```
//!
//! Requests dispatched for a view run concurrently but their results are
//! stored in declaration order. Any failure rejects the navigation; the
//! loading overlay is ended on every path.
//!
//! Navigations are not cancelled. A second `goto_view` while one is in
//! flight runs alongside it and both write the shared stores.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info, warn};
use uuid::Uuid;

use crate::core::callback;
use crate::core::cleanup;
use crate::core::config::DEFAULT_VIEW;
use crate::core::error::NavigationError;
use crate::core::query;
use crate::core::state::AppState;
use crate::platform::{ContentLoader, Display, History, Loading};
use crate::request::dispatch::{self, RequestDispatcher};
use crate::request::{Payload, ViewHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    CleaningPrevious,
    Resolving,
    Dispatching,
    Aggregating,
    Activating,
    Callback,
}

/// The external collaborators a navigator drives.
#[derive(Clone)]
pub struct Platform {
    pub display: Arc<dyn Display>,
    pub loading: Arc<dyn Loading>,
    pub history: Arc<dyn History>,
    pub loader: Arc<dyn ContentLoader>,
}

/// Outcome of a completed navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct Navigation {
    pub name: String,
    pub query_string: String,
    pub view: Option<ViewHandle>,
}

pub struct Navigator {
    state: AppState,
    dispatcher: RequestDispatcher,
    display: Arc<dyn Display>,
    loading: Arc<dyn Loading>,
    history: Arc<dyn History>,
    popstate: AtomicBool,
    current_name: RwLock<String>,
    phase: RwLock<Phase>,
}

impl Navigator {
    pub fn new(state: AppState, platform: Platform) -> Self {
        Self::with_dispatcher(
            state,
            RequestDispatcher::new(reqwest::Client::new(), Arc::clone(&platform.loader)),
            platform,
        )
    }

    pub fn with_dispatcher(state: AppState, dispatcher: RequestDispatcher, platform: Platform) -> Self {
        Self {
            state,
            dispatcher,
            display: platform.display,
            loading: platform.loading,
            history: platform.history,
            popstate: AtomicBool::new(false),
            current_name: RwLock::new(DEFAULT_VIEW.to_string()),
            phase: RwLock::new(Phase::Idle),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Name of the most recently resolved view.
    pub fn current_name(&self) -> String {
        self.current_name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn phase(&self) -> Phase {
        *self.phase.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self, id: &Uuid, phase: Phase) {
        debug!("[{}] -> {:?}", id, phase);
        *self.phase.write().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    fn set_current_name(&self, name: &str) {
        *self
            .current_name
            .write()
            .unwrap_or_else(PoisonError::into_inner) = name.to_string();
    }

    /// Browser back/forward. Re-navigates to the location without pushing
    /// history. Ignored unless SPA mode is on.
    pub async fn popstate(&self) -> Result<Option<Navigation>, NavigationError> {
        if !self.state.config.spa {
            debug!("popstate ignored: SPA mode is off");
            return Ok(None);
        }
        self.popstate.store(true, Ordering::SeqCst);
        self.goto_view(None).await.map(Some)
    }

    /// Navigates to `name`, or to the current location when `None`.
    pub async fn goto_view(&self, name: Option<&str>) -> Result<Navigation, NavigationError> {
        let id = Uuid::new_v4();
        let location = self.history.location();
        let target = query::parse(name, &location, &self.state.config.routing);
        info!(
            "[{}] navigation to '{}' (requested {:?})",
            id, target.name, name
        );

        let show_loading = self.state.config.loading_enabled(&target.name);
        if show_loading {
            self.enter(&id, Phase::Loading);
            let (_, captured) = futures::join!(self.loading.start(), self.display.capture());
            if let Err(e) = captured {
                warn!("[{}] snapshot failed: {}", id, e);
                self.finish(&id, show_loading).await;
                return Err(e);
            }
        }

        let result = self.transaction(&id, name).await;
        if let Err(e) = &result {
            warn!("[{}] navigation failed: {}", id, e);
        }
        self.finish(&id, show_loading).await;
        result
    }

    async fn finish(&self, id: &Uuid, show_loading: bool) {
        if show_loading {
            self.loading.end().await;
        }
        self.enter(id, Phase::Idle);
    }

    async fn transaction(&self, id: &Uuid, name: Option<&str>) -> Result<Navigation, NavigationError> {
        self.enter(id, Phase::CleaningPrevious);
        let previous = self.current_name();
        cleanup::remove_response(&self.state, &previous);

        self.enter(id, Phase::Resolving);
        let resolution = query::resolve(
            &self.state.query,
            name,
            &self.history.location(),
            &self.state.config.routing,
        );
        self.set_current_name(&resolution.name);

        let from_popstate = self.popstate.swap(false, Ordering::SeqCst);
        if self.state.config.spa && !from_popstate {
            let url = format!(
                "{}/{}{}",
                self.history.origin(),
                resolution.name,
                resolution.query_string
            );
            self.history.push_state(&url);
        }

        self.enter(id, Phase::Dispatching);
        let tasks = self.dispatcher.build_requests(&self.state, &resolution.name);
        debug!("[{}] dispatched {} request(s)", id, tasks.len());

        let envelopes = dispatch::join(tasks).await?;

        self.enter(id, Phase::Aggregating);
        for envelope in envelopes {
            if envelope.name.is_empty() {
                continue;
            }
            self.state.response.set(envelope.name, envelope.response);
        }

        self.enter(id, Phase::Activating);
        let view = self
            .display
            .add_child(&resolution.name, &self.state.response)
            .await?;

        if let Some(view) = &view {
            self.enter(id, Phase::Callback);
            let callbacks = self.state.config.activation_callback(&resolution.name);
            callback::execute(&self.state.packages, callbacks, &Payload::View(view.clone()))
                .await?;
        }

        info!(
            "[{}] '{}' ready with {} response(s)",
            id,
            resolution.name,
            self.state.response.len()
        );

        Ok(Navigation {
            name: resolution.name,
            query_string: resolution.query_string,
            view,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::package::PackageRegistry;
    use crate::test_support::{
        DelayedJson, FailingDisplay, Recorder, StaticLoader, TestPlatform, test_platform,
        test_state_with,
    };
    use serde_json::json;

    fn navigator(config: serde_json::Value, initial: &str) -> (Navigator, TestPlatform, Recorder) {
        let recorder = Recorder::default();
        let calls = recorder.clone();
        let mut packages = PackageRegistry::new();
        packages.register("Recorder", move || calls.clone());

        let state = test_state_with(config, packages);
        let platform = test_platform(&state, initial);
        let dispatcher = RequestDispatcher::new(
            reqwest::Client::new(),
            Arc::new(StaticLoader::with_symbols(&["app.Symbol"])),
        )
        .with_json(Arc::new(DelayedJson::new(&[("/slow", 30)])));
        (
            Navigator::with_dispatcher(state, dispatcher, platform.platform()),
            platform,
            recorder,
        )
    }

    #[tokio::test]
    async fn test_navigation_stores_responses_and_activates_view() {
        let (nav, platform, recorder) = navigator(
            json!({"routing": {"top": {
                "requests": [
                    {"type": "json", "name": "a", "path": "/slow"},
                    {"type": "json", "path": "/anonymous"},
                    {"type": "json", "name": "b", "path": "/b"}
                ],
                "callback": "Recorder"
            }}}),
            "/",
        );

        let navigation = nav.goto_view(None).await.unwrap();
        assert_eq!(navigation.name, "top");
        let view = navigation.view.unwrap();
        assert_eq!(view.name, "top");
        assert_eq!(nav.state().response.keys(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(recorder.values(), vec![json!({"view": "top", "id": view.id})]);
        assert_eq!(nav.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_previous_view_responses_are_removed() {
        let (nav, _platform, _recorder) = navigator(
            json!({"routing": {
                "top": {"requests": [{"type": "content", "name": "top_content", "path": "/top.json"}]},
                "next": {"requests": [{"type": "json", "name": "n", "path": "/n"}]}
            }}),
            "/",
        );

        nav.goto_view(None).await.unwrap();
        assert!(nav.state().response.has("top_content"));
        assert!(nav.state().symbols.has("Symbol"));

        nav.goto_view(Some("next")).await.unwrap();
        assert_eq!(nav.state().response.keys(), vec!["n".to_string()]);
        assert!(!nav.state().symbols.has("Symbol"));
        assert_eq!(nav.current_name(), "next");
    }

    #[tokio::test]
    async fn test_spa_pushes_history_but_popstate_does_not() {
        let (nav, platform, _recorder) = navigator(
            json!({"spa": true, "routing": {"top": {}, "products": {}}}),
            "/",
        );

        nav.goto_view(Some("products?page=2")).await.unwrap();
        assert_eq!(platform.history.len(), 2);
        assert_eq!(platform.history.current_url(), "https://example.com/products?page=2");
        assert_eq!(nav.state().query.get("page").as_deref(), Some("2"));

        assert!(platform.history.back());
        let navigation = nav.popstate().await.unwrap().unwrap();
        assert_eq!(navigation.name, "top");
        assert_eq!(platform.history.len(), 2);
        assert!(nav.state().query.is_empty());

        // The flag is consumed by one navigation only
        nav.goto_view(Some("products")).await.unwrap();
        assert_eq!(platform.history.len(), 2);
        assert_eq!(platform.history.current_url(), "https://example.com/products");
    }

    #[tokio::test]
    async fn test_popstate_ignored_without_spa() {
        let (nav, platform, _recorder) = navigator(json!({"routing": {"top": {}}}), "/");
        assert_eq!(nav.popstate().await.unwrap(), None);
        assert!(platform.display.activated().is_empty());
    }

    #[tokio::test]
    async fn test_loading_overlay_ends_on_failure() {
        let (nav, platform, recorder) = navigator(
            json!({"loading": true, "routing": {"top": {"requests": [
                {"type": "json", "name": "ok", "path": "/ok"},
                {"type": "json", "name": "bad", "path": "/fail"}
            ]}}}),
            "/",
        );

        let err = nav.goto_view(None).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(platform.loading.started(), 1);
        assert_eq!(platform.loading.active(), 0);
        assert_eq!(platform.display.snapshot_count(), 1);
        assert!(nav.state().response.is_empty());
        assert!(platform.display.activated().is_empty());
        assert!(recorder.values().is_empty());
        assert_eq!(nav.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_route_can_disable_loading() {
        let (nav, platform, _recorder) = navigator(
            json!({"loading": true, "routing": {"top": {"loading": false}}}),
            "/",
        );
        nav.goto_view(None).await.unwrap();
        assert_eq!(platform.loading.started(), 0);
        assert_eq!(platform.display.snapshot_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_snapshot_rejects_navigation() {
        let state = test_state_with(
            json!({"loading": true, "routing": {"top": {}}}),
            PackageRegistry::new(),
        );
        let platform = test_platform(&state, "/");
        let mut collaborators = platform.platform();
        collaborators.display = Arc::new(FailingDisplay);

        let nav = Navigator::new(state, collaborators);
        let err = nav.goto_view(None).await.unwrap_err();
        assert!(matches!(err, NavigationError::Config(_)));
        assert_eq!(platform.loading.active(), 0);
    }
}
