//! Repeating pass loop with cooperative shutdown

use crate::engine::Synchronizer;
use mirrorsync_types::{ActionLog, Result, SyncReport};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Creates a linked shutdown trigger and signal
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), ShutdownSignal(rx))
}

/// Requests that a [`SyncLoop`] stop after its current pass
#[derive(Debug)]
pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    /// Request shutdown; later calls have no further effect
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }
}

/// Observes a [`ShutdownTrigger`]
#[derive(Debug, Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

impl ShutdownSignal {
    /// Whether shutdown has been requested
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolve once shutdown is requested; never resolves if the trigger was
    /// dropped without firing
    pub async fn triggered(&mut self) {
        loop {
            if *self.0.borrow_and_update() {
                return;
            }
            if self.0.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Runs a synchronizer over and over with a fixed pause between passes
///
/// The pause starts when a pass ends, so the period is the pass duration plus
/// the interval. A pass is never interrupted; shutdown is honoured before a
/// pass starts and while sleeping. Any pass error ends the loop.
#[derive(Debug)]
pub struct SyncLoop<L> {
    synchronizer: Synchronizer<L>,
    source: PathBuf,
    replica: PathBuf,
    interval: Duration,
    max_passes: Option<u64>,
}

impl<L: ActionLog + Send + Sync> SyncLoop<L> {
    /// Create a loop mirroring `source` into `replica` every `interval`
    pub fn new(
        synchronizer: Synchronizer<L>,
        source: impl Into<PathBuf>,
        replica: impl Into<PathBuf>,
        interval: Duration,
    ) -> Self {
        Self {
            synchronizer,
            source: source.into(),
            replica: replica.into(),
            interval,
            max_passes: None,
        }
    }

    /// Stop on its own after `passes` completed passes
    pub fn with_max_passes(mut self, passes: u64) -> Self {
        self.max_passes = Some(passes);
        self
    }

    /// The synchronizer driven by this loop
    pub fn synchronizer(&self) -> &Synchronizer<L> {
        &self.synchronizer
    }

    /// Run until shutdown, the pass limit, or a pass error; returns the
    /// number of completed passes
    pub async fn run(&self, shutdown: ShutdownSignal) -> Result<u64> {
        self.run_with(shutdown, |_| {}).await
    }

    /// Same as [`SyncLoop::run`], handing each pass report to `on_pass`
    /// before sleeping
    pub async fn run_with<F>(&self, mut shutdown: ShutdownSignal, mut on_pass: F) -> Result<u64>
    where
        F: FnMut(&SyncReport),
    {
        let mut passes = 0u64;

        loop {
            if shutdown.is_triggered() {
                info!("Shutdown requested, stopping before next pass");
                break;
            }

            let report = self
                .synchronizer
                .synchronize(&self.source, &self.replica)
                .await?;
            passes += 1;
            on_pass(&report);

            if self.max_passes.is_some_and(|max| passes >= max) {
                debug!("Reached pass limit of {}", passes);
                break;
            }

            debug!("Sleeping {:?} before next pass", self.interval);
            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                () = shutdown.triggered() => {
                    info!("Shutdown requested during sleep");
                    break;
                }
            }
        }

        Ok(passes)
    }
}
