//! # Requests
//!
//! Descriptors declared per view, the services that execute them, and the
//! dispatcher that turns a view's routing entry into running tasks.

pub mod dispatch;
pub mod service;
pub mod services;
pub mod types;

pub use dispatch::{RequestDispatcher, RequestTask};
pub use service::RequestService;
pub use services::{ContentService, CustomService, HttpContentLoader, JsonService};
pub use types::{
    Callbacks, Content, ContentKind, CustomRequest, HttpRequest, LoaderInfo, Payload,
    RequestDescriptor, ResponseEnvelope, ViewHandle,
};
