//! Metrics module for the pages endpoint.

pub mod http;
pub mod setup;
pub mod sync;

pub use setup::init_metrics;
