//! # Configuration
//!
//! The static application configuration: SPA/loading switches, the per-view
//! routing table, and free-form variables used by `{{key}}` templates.
//!
//! Override hierarchy: defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.waypoint/config.toml` unless a path is given. JSON files
//! (`.json`) are read with serde_json, anything else as TOML. If the default
//! file is missing on first run, a commented-out template is generated.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::request::{Callbacks, RequestDescriptor};

// ============================================================================
// Config Structs
// ============================================================================

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub spa: bool,
    #[serde(default)]
    pub loading: bool,
    #[serde(default)]
    pub stage: StageConfig,
    #[serde(default, rename = "gotoView", alias = "goto_view")]
    pub goto_view: Option<GotoViewConfig>,
    #[serde(default)]
    pub routing: HashMap<String, RouteEntry>,
    /// Every other top-level key, available to `{{key}}` substitution.
    #[serde(flatten)]
    pub variables: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct StageConfig {
    #[serde(default = "default_stage_width")]
    pub width: u32,
    #[serde(default = "default_stage_height")]
    pub height: u32,
    #[serde(default = "default_stage_fps")]
    pub fps: u32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_STAGE_WIDTH,
            height: DEFAULT_STAGE_HEIGHT,
            fps: DEFAULT_STAGE_FPS,
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct GotoViewConfig {
    #[serde(default)]
    pub callback: Option<Callbacks>,
}

/// Routing for one view.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct RouteEntry {
    #[serde(default)]
    pub requests: Vec<RequestDescriptor>,
    /// Run against the view handle once the view is activated.
    #[serde(default)]
    pub callback: Option<Callbacks>,
    /// Private views can't be entered from the location bar.
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub redirect: Option<String>,
    /// Overrides the global `loading` flag for this view.
    #[serde(default)]
    pub loading: Option<bool>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_VIEW: &str = "top";
pub const DEFAULT_STAGE_WIDTH: u32 = 240;
pub const DEFAULT_STAGE_HEIGHT: u32 = 240;
pub const DEFAULT_STAGE_FPS: u32 = 60;

fn default_stage_width() -> u32 {
    DEFAULT_STAGE_WIDTH
}

fn default_stage_height() -> u32 {
    DEFAULT_STAGE_HEIGHT
}

fn default_stage_fps() -> u32 {
    DEFAULT_STAGE_FPS
}

impl AppConfig {
    pub fn route(&self, name: &str) -> Option<&RouteEntry> {
        self.routing.get(name)
    }

    /// Whether navigating to `name` shows the loading overlay.
    pub fn loading_enabled(&self, name: &str) -> bool {
        self.route(name)
            .and_then(|route| route.loading)
            .unwrap_or(self.loading)
    }

    /// The activation callback for `name`: the route's own, else `gotoView.callback`.
    pub fn activation_callback(&self, name: &str) -> Option<&Callbacks> {
        self.route(name)
            .and_then(|route| route.callback.as_ref())
            .or_else(|| self.goto_view.as_ref().and_then(|g| g.callback.as_ref()))
            .filter(|callbacks| !callbacks.is_empty())
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.waypoint/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".waypoint").join("config.toml"))
}

/// Parses configuration text. `.json` paths use JSON, everything else TOML.
pub fn parse_config(contents: &str, path: &Path) -> Result<AppConfig, ConfigError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    } else {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Load config from `path`, or from `~/.waypoint/config.toml` when `None`.
///
/// An explicit path must exist. A missing default file is generated and
/// `AppConfig::default()` returned.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match config_path() {
            Some(p) => {
                if !p.exists() {
                    info!("No config file found, generating default at {}", p.display());
                    generate_default_config(&p);
                    return Ok(AppConfig::default());
                }
                p
            }
            None => {
                warn!("Could not determine home directory, using default config");
                return Ok(AppConfig::default());
            }
        },
    };

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config = parse_config(&contents, &path)?;
    info!(
        "Loaded config from {} ({} routes)",
        path.display(),
        config.routing.len()
    );
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    let default_content = r#"# Waypoint Configuration
# All settings are optional. Override hierarchy: defaults → this file → env vars → CLI flags.

# spa = true                 # push history entries; honour back/forward
# loading = true             # show the loading overlay while navigating
# api = "https://example.com/api"   # any extra key is usable as {{api}}

# [stage]
# width = 240
# height = 240
# fps = 60

# [gotoView]
# callback = "app.callback.Activated"

# [[routing.top.requests]]
# type = "json"
# name = "news"
# path = "{{api}}/news.json"
# cache = true

# [routing.account]
# private = true
# redirect = "top"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Command-line switches that win over everything else (None = not specified).
#[derive(Debug, Default, Clone, Copy)]
pub struct CliOverrides {
    pub spa: Option<bool>,
    pub loading: Option<bool>,
}

fn env_flag(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            warn!("Ignoring {key}={other}: expected a boolean");
            None
        }
    }
}

/// Collapse env vars and CLI flags onto a loaded config.
pub fn resolve(mut config: AppConfig, cli: CliOverrides) -> AppConfig {
    // SPA: CLI → env → config
    if let Some(spa) = cli.spa.or_else(|| env_flag("WAYPOINT_SPA")) {
        config.spa = spa;
    }

    // Loading: CLI → env → config
    if let Some(loading) = cli.loading.or_else(|| env_flag("WAYPOINT_LOADING")) {
        config.loading = loading;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_empty() {
        let config = AppConfig::default();
        assert!(!config.spa);
        assert!(config.routing.is_empty());
        assert_eq!(config.stage.width, DEFAULT_STAGE_WIDTH);
    }

    #[test]
    fn test_json_config_parses() {
        let json = r#"{
            "spa": true,
            "loading": true,
            "api": {"host": "https://example.com"},
            "gotoView": {"callback": ["a", "b"]},
            "routing": {
                "top": {"requests": [{"type": "json", "name": "news", "path": "{{api.host}}/news"}]},
                "account": {"private": true, "redirect": "login", "loading": false}
            }
        }"#;
        let config = parse_config(json, Path::new("app.json")).unwrap();

        assert!(config.spa);
        assert_eq!(config.routing.len(), 2);
        assert_eq!(config.route("top").unwrap().requests.len(), 1);
        assert!(config.route("account").unwrap().private);
        assert!(config.variables.contains_key("api"));
        assert!(!config.variables.contains_key("routing"));
        assert!(config.loading_enabled("top"));
        assert!(!config.loading_enabled("account"));
    }

    #[test]
    fn test_toml_config_parses() {
        let toml_str = r#"
spa = true
endpoint = "https://example.com"

[[routing.top.requests]]
type = "json"
name = "news"
path = "{{endpoint}}/news.json"
cache = true

[routing.products]
callback = "app.Products"
"#;
        let config = parse_config(toml_str, Path::new("config.toml")).unwrap();
        assert!(config.spa);
        assert!(!config.loading);
        let top = config.route("top").unwrap();
        assert_eq!(top.requests[0].name(), Some("news"));
        assert!(top.requests[0].cache());
        assert_eq!(
            config.variables.get("endpoint").and_then(Value::as_str),
            Some("https://example.com")
        );
    }

    #[test]
    fn test_malformed_config_is_parse_error() {
        let err = parse_config("{ not json", Path::new("broken.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_activation_callback_prefers_route() {
        let json = r#"{
            "gotoView": {"callback": "global"},
            "routing": {"top": {"callback": "local"}, "other": {}}
        }"#;
        let config = parse_config(json, Path::new("a.json")).unwrap();
        assert_eq!(
            config.activation_callback("top").map(|c| c.names()),
            Some(vec!["local"])
        );
        assert_eq!(
            config.activation_callback("other").map(|c| c.names()),
            Some(vec!["global"])
        );
    }

    #[test]
    fn test_empty_global_callback_is_none() {
        let json = r#"{"gotoView": {"callback": ""}, "routing": {"top": {}}}"#;
        let config = parse_config(json, Path::new("a.json")).unwrap();
        assert!(config.activation_callback("top").is_none());
    }

    #[test]
    fn test_cli_overrides_win() {
        let config = AppConfig {
            spa: false,
            loading: true,
            ..Default::default()
        };
        let resolved = resolve(
            config,
            CliOverrides {
                spa: Some(true),
                loading: Some(false),
            },
        );
        assert!(resolved.spa);
        assert!(!resolved.loading);
    }
}
