//! Cancellable periodic background tasks

use futures::future::join_all;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, warn, Instrument, Span};

/// Shortest cadence a task runs at; a zero period is raised to this.
pub(crate) const MIN_PERIOD: Duration = Duration::from_millis(1);

/// A group of fixed-cadence tasks sharing one shutdown signal.
///
/// Ticks never overlap: a tick that overruns its period delays the next one.
/// Dropping the group without calling [`PeriodicTasks::stop`] also ends the
/// tasks, at their next suspension point.
pub(crate) struct PeriodicTasks {
    shutdown_tx: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    grace: Duration,
}

impl PeriodicTasks {
    pub(crate) fn new(grace: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
            grace,
        }
    }

    /// Run `tick` every `period`, first one period from now.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn<F>(&self, name: &'static str, period: Duration, span: Span, mut tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        let period = if period.is_zero() {
            warn!(parent: &span, task = name, "Zero task period, using {:?}", MIN_PERIOD);
            MIN_PERIOD
        } else {
            period
        };
        let mut shutdown = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(
            async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        biased;
                        changed = shutdown.changed() => {
                            if changed.is_err() || *shutdown.borrow() {
                                debug!(task = name, "Periodic task stopping");
                                break;
                            }
                        }
                        _ = ticker.tick() => tick(),
                    }
                }
            }
            .instrument(span),
        );
        self.handles.lock().push(handle);
    }

    /// Signal every task and wait for them, at most for the grace period.
    ///
    /// Tasks still running after the grace period are aborted. Returns
    /// `false` when the group had already been stopped.
    pub(crate) async fn stop(&self) -> bool {
        let already_stopped = self.shutdown_tx.send_replace(true);

        let handles = std::mem::take(&mut *self.handles.lock());
        if handles.is_empty() {
            return !already_stopped;
        }

        let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();
        match tokio::time::timeout(self.grace, join_all(handles)).await {
            Ok(results) => {
                for failed in results.into_iter().filter_map(Result::err) {
                    error!(error = %failed, "Periodic task ended abnormally");
                }
            }
            Err(_) => {
                warn!(
                    grace_ms = self.grace.as_millis() as u64,
                    "Periodic tasks did not finish within the grace period, aborting"
                );
                for abort in aborts {
                    abort.abort();
                }
            }
        }
        !already_stopped
    }

    pub(crate) fn is_stopped(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}
