//! Pages Server - HTTP endpoint for sites synchronized from Git
//!
//! This crate provides the Axum-based public and private routers, domain
//! resolution, static file responses and process configuration.

pub mod error;
pub mod extractors;
pub mod files;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod resolve;
pub mod server;
pub mod settings;
pub mod state;

pub use error::AppError;
pub use resolve::{DomainResolver, ResolveError, Resolution};
pub use server::{create_private_router, create_router, run_servers, shutdown_signal};
pub use settings::Settings;
pub use state::AppState;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_defined() {
        assert!(!version().is_empty());
    }
}
