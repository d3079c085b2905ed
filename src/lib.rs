//! Waypoint: route-driven request orchestration for single-page views.

pub mod core;
pub mod platform;
pub mod request;

#[cfg(test)]
pub mod test_support;
