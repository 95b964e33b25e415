//! Application state.

use std::sync::Arc;

use pages_git::{Registry, ShutdownSignal, SyncTrigger};

use crate::resolve::DomainResolver;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Every hosted site, keyed by domain.
    registry: Arc<Registry>,
    /// Maps requests onto sites.
    resolver: DomainResolver,
    /// Runs on-demand syncs.
    trigger: SyncTrigger,
}

impl AppState {
    /// Creates a new AppState over `registry`, observing `signal`.
    pub fn new(registry: Arc<Registry>, signal: ShutdownSignal) -> Self {
        Self {
            resolver: DomainResolver::new(Arc::clone(&registry)),
            trigger: SyncTrigger::new(signal),
            registry,
        }
    }

    /// Returns the site registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the domain resolver.
    pub fn resolver(&self) -> &DomainResolver {
        &self.resolver
    }

    /// Returns the on-demand sync trigger.
    pub fn trigger(&self) -> &SyncTrigger {
        &self.trigger
    }

    /// Returns the endpoint-wide shutdown signal.
    pub fn signal(&self) -> &ShutdownSignal {
        self.trigger.signal()
    }
}
