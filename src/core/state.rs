//! # Application State
//!
//! The context object shared by the navigator and every request service.
//! One `AppState` per running application; tests build a fresh one each.
//!
//! ```text
//! AppState
//! ├── config: Arc<AppConfig>          // routing table + template variables
//! ├── packages: Arc<PackageRegistry>  // callback / custom handlers
//! ├── cache: ResponseCache            // name → last fetched value
//! ├── response: ResponseStore         // name → current view's value
//! ├── query: QueryMap                 // current query parameters
//! └── symbols: SymbolIndex            // symbol → loader info
//! ```

use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::core::package::PackageRegistry;
use crate::core::store::{QueryMap, ResponseCache, ResponseStore, SymbolIndex};
use crate::core::template::ConfigParser;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub packages: Arc<PackageRegistry>,
    pub cache: ResponseCache,
    pub response: ResponseStore,
    pub query: QueryMap,
    pub symbols: SymbolIndex,
}

impl AppState {
    pub fn new(config: AppConfig, packages: PackageRegistry) -> Self {
        Self {
            config: Arc::new(config),
            packages: Arc::new(packages),
            cache: ResponseCache::new(),
            response: ResponseStore::new(),
            query: QueryMap::new(),
            symbols: SymbolIndex::new(),
        }
    }

    /// Template parser bound to this configuration's variables.
    pub fn parser(&self) -> ConfigParser<'_> {
        ConfigParser::new(&self.config.variables)
    }
}
