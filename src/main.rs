use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use serde_json::{Map, Value, json};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use waypoint::core::config::{self, CliOverrides};
use waypoint::core::{AppState, Navigation, Navigator, PackageRegistry, Platform};
use waypoint::platform::{HeadlessDisplay, LogLoading, MemoryHistory};
use waypoint::request::HttpContentLoader;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "waypoint",
    about = "Resolve views from a routing table and fetch what they declare"
)]
struct Args {
    /// Routing configuration (.json or .toml). Defaults to ~/.waypoint/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulated browser location: path plus optional query
    #[arg(short, long, default_value = "/")]
    location: String,

    /// Origin used for history entries
    #[arg(long, default_value = "http://localhost")]
    origin: String,

    /// Views to visit in order. With none, the location decides
    views: Vec<String>,

    /// Press the back button this many times afterwards (SPA mode only)
    #[arg(long, default_value_t = 0)]
    back: usize,

    /// Override SPA mode
    #[arg(long)]
    spa: Option<bool>,

    /// Override the loading overlay
    #[arg(long)]
    loading: Option<bool>,

    #[arg(long, default_value_t, value_enum)]
    log_level: LogLevel,

    #[arg(long, default_value = "waypoint.log")]
    log_file: PathBuf,
}

fn report(navigator: &Navigator, navigation: &Navigation) -> Value {
    let mut responses = Map::new();
    for (name, payload) in navigator.state().response.snapshot() {
        responses.insert(name, payload.to_json());
    }
    json!({
        "view": navigation.name,
        "query": navigation.query_string,
        "activated": navigation.view.is_some(),
        "responses": responses,
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(&args.log_file) {
        let _ = WriteLogger::init(args.log_level.into(), log_config, log_file);
    }

    let loaded = config::load_config(args.config.as_deref())?;
    let app_config = config::resolve(
        loaded,
        CliOverrides {
            spa: args.spa,
            loading: args.loading,
        },
    );
    log::info!(
        "Waypoint starting: {} routes, spa={}, loading={}",
        app_config.routing.len(),
        app_config.spa,
        app_config.loading
    );

    let history = Arc::new(MemoryHistory::new(&args.origin, &args.location));
    let display = Arc::new(HeadlessDisplay::new(
        app_config.stage,
        app_config.routing.keys().cloned(),
    ));
    let platform = Platform {
        display,
        loading: Arc::new(LogLoading::new()),
        history: history.clone(),
        loader: Arc::new(HttpContentLoader::default()),
    };
    let navigator = Navigator::new(AppState::new(app_config, PackageRegistry::new()), platform);

    let mut reports = Vec::new();
    if args.views.is_empty() {
        let navigation = navigator.goto_view(None).await?;
        reports.push(report(&navigator, &navigation));
    }
    for view in &args.views {
        let navigation = navigator.goto_view(Some(view)).await?;
        reports.push(report(&navigator, &navigation));
    }
    for _ in 0..args.back {
        if !history.back() {
            break;
        }
        if let Some(navigation) = navigator.popstate().await? {
            reports.push(report(&navigator, &navigation));
        }
    }

    let output = json!({
        "navigations": reports,
        "history": history.entries(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
