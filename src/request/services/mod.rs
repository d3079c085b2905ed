pub mod content;
pub mod custom;
pub mod json;

pub use content::{ContentService, HttpContentLoader};
pub use custom::CustomService;
pub use json::JsonService;
