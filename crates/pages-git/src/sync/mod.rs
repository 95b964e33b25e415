//! Background synchronization and lock coordination.
//!
//! This module provides the scheduler that refreshes every site on its
//! interval, the per-site lock readers and syncs share, and the
//! endpoint-wide cancellation signal.

mod lock;
mod scheduler;
mod shutdown;
mod state;

pub use lock::{SiteLock, TreeReadGuard, TreeWriteGuard};
pub use scheduler::{SchedulerConfig, SchedulerHandle, SyncScheduler, SyncTrigger};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use state::{SyncState, SyncStatus};
