//! Offline sweep worker

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::lifecycle::StatusLifecycle;

/// Run the sweep every `interval` until `shutdown_signal` resolves
pub async fn run<S, F>(
    interval: Duration,
    lifecycle: &StatusLifecycle,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Sweeper starting (interval {:?})...", interval);

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Sweeper shutting down...");
                return;
            }
            _ = sleep_fn(interval) => {}
        }

        let demoted = lifecycle.sweep();
        debug!("Sweep done, {} device(s) went offline", demoted.len());
    }
}

/// Starts and stops the sweeper with the bus session
///
/// The sweeper only ticks while connected. Stopping waits for the task to
/// exit, so no tick runs after `stop` returns.
pub struct SweepSchedule {
    lifecycle: Arc<StatusLifecycle>,
    running: Option<(oneshot::Sender<()>, JoinHandle<()>)>,
}

impl SweepSchedule {
    pub fn new(lifecycle: Arc<StatusLifecycle>) -> Self {
        Self {
            lifecycle,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start ticking; no-op if already running
    pub fn start(&mut self) {
        if self.running.is_some() {
            return;
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let lifecycle = self.lifecycle.clone();
        let interval = lifecycle.sweep_interval();
        let handle = tokio::spawn(async move {
            run(
                interval,
                lifecycle.as_ref(),
                tokio::time::sleep,
                Box::pin(async move {
                    let _ = stop_rx.await;
                }),
            )
            .await;
        });

        self.running = Some((stop_tx, handle));
    }

    /// Stop ticking and wait for the task; no-op if not running
    pub async fn stop(&mut self) {
        let Some((stop_tx, handle)) = self.running.take() else {
            return;
        };
        let _ = stop_tx.send(());
        if let Err(e) = handle.await {
            error!("Sweeper task failed: {}", e);
        }
    }
}
