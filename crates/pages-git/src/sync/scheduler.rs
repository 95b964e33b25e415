//! Multi-site sync scheduler.
//!
//! Every site with a sync interval gets its own timer task. Timers push the
//! site's domain into one shared queue; a single coordinator drains the
//! queue and dispatches each sync as a background task, so a slow site never
//! delays another site's schedule or the shutdown signal.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

use super::ShutdownSignal;
use crate::error::SiteError;
use crate::registry::Registry;
use crate::source::{ContentSource, SyncOutcome};

/// Configuration for the sync scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of syncs running at once, across all sites.
    pub max_concurrent: usize,
    /// How long shutdown waits for in-flight syncs before abandoning them.
    pub shutdown_grace: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

/// On-demand sync entry point, independent of the periodic schedule.
#[derive(Debug, Clone)]
pub struct SyncTrigger {
    signal: ShutdownSignal,
}

impl SyncTrigger {
    /// Creates a trigger bound to the endpoint's shutdown signal.
    pub fn new(signal: ShutdownSignal) -> Self {
        Self { signal }
    }

    /// Syncs `source` now and reports the outcome to the caller.
    pub async fn sync_now(&self, source: &ContentSource) -> Result<SyncOutcome, SiteError> {
        info!(domain = source.domain(), "Manual sync triggered");
        source.sync(&self.signal).await
    }

    /// Returns the shutdown signal the trigger observes.
    pub fn signal(&self) -> &ShutdownSignal {
        &self.signal
    }
}

/// Handle for a running scheduler.
pub struct SchedulerHandle {
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Waits for the scheduler to stop. Completes after the shutdown signal
    /// fired and in-flight syncs finished or the grace period ran out.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!("Sync scheduler task failed: {}", e);
        }
    }

    /// Returns true once the scheduler has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Background scheduler refreshing every site of a registry.
pub struct SyncScheduler {
    registry: Arc<Registry>,
    config: SchedulerConfig,
}

impl SyncScheduler {
    /// Creates a new sync scheduler.
    pub fn new(registry: Arc<Registry>, config: SchedulerConfig) -> Self {
        Self { registry, config }
    }

    /// Creates a scheduler with default configuration.
    pub fn with_defaults(registry: Arc<Registry>) -> Self {
        Self::new(registry, SchedulerConfig::default())
    }

    /// Starts the timers and the coordinator loop.
    pub fn start(self, signal: ShutdownSignal) -> SchedulerHandle {
        SchedulerHandle {
            task: tokio::spawn(self.run(signal)),
        }
    }

    async fn run(self, mut signal: ShutdownSignal) {
        let (tx, mut rx) = mpsc::channel::<String>(self.registry.len().max(1) * 4);
        let mut timers = JoinSet::new();

        for (domain, source) in self.registry.iter() {
            let config = source.config();
            if !config.periodic_sync() {
                debug!(domain = domain, "Periodic sync disabled");
                continue;
            }

            timers.spawn(tick(domain.to_string(), config.sync_interval(), tx.clone()));
        }
        drop(tx);

        info!(
            sites = self.registry.len(),
            timers = timers.len(),
            max_concurrent = self.config.max_concurrent,
            "Starting sync scheduler"
        );

        let permits = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let mut workers: JoinSet<String> = JoinSet::new();
        let mut in_flight: HashSet<String> = HashSet::new();
        let mut timers_running = !timers.is_empty();

        loop {
            tokio::select! {
                _ = signal.cancelled() => {
                    info!("Sync scheduler shutting down");
                    break;
                }
                event = rx.recv(), if timers_running => match event {
                    Some(domain) => {
                        if !in_flight.insert(domain.clone()) {
                            debug!(domain = %domain, "Previous sync still running, skipping tick");
                            continue;
                        }

                        let Some(source) = self.registry.get(&domain).cloned() else {
                            in_flight.remove(&domain);
                            continue;
                        };

                        workers.spawn(dispatch(domain, source, Arc::clone(&permits), signal.clone()));
                    },
                    None => timers_running = false,
                },
                Some(joined) = workers.join_next(), if !workers.is_empty() => match joined {
                    Ok(domain) => {
                        in_flight.remove(&domain);
                    },
                    Err(e) => error!("Sync task failed: {}", e),
                },
            }
        }

        timers.abort_all();
        self.drain(workers).await;
        info!("Sync scheduler stopped");
    }

    /// Gives in-flight syncs the grace period to finish, then abandons them.
    async fn drain(&self, mut workers: JoinSet<String>) {
        if workers.is_empty() {
            return;
        }

        debug!(pending = workers.len(), "Waiting for in-flight syncs");

        let drained = tokio::time::timeout(self.config.shutdown_grace, async {
            while workers.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!(
                abandoned = workers.len(),
                "Shutdown grace period elapsed, abandoning syncs"
            );
            workers.abort_all();
        }
    }
}

/// Emits `domain` into the shared queue once per `period`.
async fn tick(domain: String, period: Duration, tx: mpsc::Sender<String>) {
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        timer.tick().await;
        if tx.send(domain.clone()).await.is_err() {
            break;
        }
    }
}

/// Runs one scheduled sync once a concurrency permit is available.
async fn dispatch(
    domain: String,
    source: Arc<ContentSource>,
    permits: Arc<Semaphore>,
    mut signal: ShutdownSignal,
) -> String {
    let _permit = tokio::select! {
        permit = permits.acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(_) => return domain,
        },
        _ = signal.cancelled() => return domain,
    };

    // Failures are recorded and logged by the source, the schedule carries on
    let _ = source.sync(&signal).await;

    domain
}
