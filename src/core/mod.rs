//! # Core Navigation Logic
//!
//! Everything that decides *what* to fetch, *when*, and *where the results
//! go*. It knows nothing about a specific display technology; the platform
//! collaborators are injected.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │        Navigator        │
//!                    │  loading → cleanup →    │
//!                    │  resolve → dispatch →   │
//!                    │  aggregate → activate   │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//!     │    query    │     │   request   │     │  callback   │
//!     │  (resolve)  │     │ (services)  │     │ (packages)  │
//!     └─────────────┘     └──────┬──────┘     └─────────────┘
//!                                ▼
//!                     AppState: cache, response,
//!                     query, symbols, packages
//! ```

pub mod callback;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod navigator;
pub mod package;
pub mod query;
pub mod state;
pub mod store;
pub mod template;

pub use error::NavigationError;
pub use navigator::{Navigation, Navigator, Phase, Platform};
pub use package::{Package, PackageError, PackageRegistry};
pub use state::AppState;
