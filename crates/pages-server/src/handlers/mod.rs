//! HTTP handlers.

pub mod content;
pub mod health;
pub mod metrics;
pub mod sites;
pub mod sync;
