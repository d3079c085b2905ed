//! # Errors
//!
//! Every failure a navigation can surface. Variants carry enough info to
//! tell configuration mistakes apart from transport failures.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum NavigationError {
    /// Missing or invalid descriptor/route fields. Surfaces at the point of use.
    Config(String),
    /// Network-level failure (DNS, connection refused, reset).
    Network(String),
    /// Server answered with a non-2xx status.
    Api { status: u16, message: String },
    /// Response body could not be parsed.
    Parse(String),
    /// The content loader reported an I/O error.
    Load { url: String, message: String },
    /// A registered package (callback or custom request) failed.
    Package { name: String, message: String },
    /// A dispatched request task panicked or was cancelled.
    Task(String),
}

impl NavigationError {
    /// True for the failures that come from fetching or loading.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            NavigationError::Network(_)
                | NavigationError::Api { .. }
                | NavigationError::Parse(_)
                | NavigationError::Load { .. }
        )
    }
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::Config(msg) => write!(f, "config error: {msg}"),
            NavigationError::Network(msg) => write!(f, "network error: {msg}"),
            NavigationError::Api { status, message } => {
                write!(f, "HTTP {status}: {message}")
            }
            NavigationError::Parse(msg) => write!(f, "parse error: {msg}"),
            NavigationError::Load { url, message } => {
                write!(f, "failed to load {url}: {message}")
            }
            NavigationError::Package { name, message } => {
                write!(f, "package '{name}' failed: {message}")
            }
            NavigationError::Task(msg) => write!(f, "request task aborted: {msg}"),
        }
    }
}

impl std::error::Error for NavigationError {}

impl From<tokio::task::JoinError> for NavigationError {
    fn from(e: tokio::task::JoinError) -> Self {
        NavigationError::Task(e.to_string())
    }
}
