//! Graceful stop coordination
//!
//! A run stops when its deadline passes or when the process is interrupted.
//! Either way, dispatch stops first; in-flight iterations then get a bounded
//! grace window before they are aborted and counted as interrupted.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};

/// Why a run is stopping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    /// The scenario's duration elapsed
    Deadline,
    /// Ctrl-C or an equivalent external request
    Interrupt,
}

impl std::fmt::Display for StopSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopSignal::Deadline => write!(f, "deadline"),
            StopSignal::Interrupt => write!(f, "interrupt"),
        }
    }
}

/// What happened to the tasks still running when the grace window opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Finished within the grace window
    pub finished: u64,
    /// Still running when the window closed, then aborted
    pub aborted: u64,
    /// Panicked while draining
    pub panicked: u64,
}

/// Broadcasts the stop request and drains in-flight work
pub struct StopCoordinator {
    sender: watch::Sender<Option<StopSignal>>,
    graceful_stop: Duration,
}

impl StopCoordinator {
    pub fn new(graceful_stop: Duration) -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender,
            graceful_stop,
        }
    }

    pub fn graceful_stop(&self) -> Duration {
        self.graceful_stop
    }

    /// Request a stop; only the first request wins
    pub fn stop(&self, signal: StopSignal) -> Result<(), ShutdownError> {
        let mut first = false;
        self.sender.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(signal);
                first = true;
            }
            first
        });

        if first {
            info!(%signal, grace = ?self.graceful_stop, "Stopping run");
            Ok(())
        } else {
            Err(ShutdownError::AlreadyStopping)
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.sender.borrow().is_some()
    }

    /// The signal that stopped the run, if any
    pub fn signal(&self) -> Option<StopSignal> {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> StopListener {
        StopListener {
            receiver: self.sender.subscribe(),
        }
    }

    /// Translate Ctrl-C into [`StopSignal::Interrupt`]
    pub fn stop_on_ctrl_c(self: &Arc<Self>) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    warn!("Interrupt received");
                    let _ = coordinator.stop(StopSignal::Interrupt);
                }
                Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
            }
        })
    }

    /// Wait up to the grace window for `tasks`, then abort the rest
    pub async fn drain<T: 'static>(&self, tasks: &mut JoinSet<T>) -> DrainReport {
        let mut report = DrainReport::default();
        if tasks.is_empty() {
            return report;
        }

        info!(in_flight = tasks.len(), grace = ?self.graceful_stop, "Draining in-flight iterations");
        let deadline = tokio::time::Instant::now() + self.graceful_stop;

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok(_))) => report.finished += 1,
                Ok(Some(Err(e))) if e.is_panic() => {
                    error!(error = %e, "Iteration task panicked");
                    report.panicked += 1;
                }
                Ok(Some(Err(_))) => report.aborted += 1,
                Ok(None) => break,
                Err(_) => {
                    report.aborted += tasks.len() as u64;
                    tasks.abort_all();
                    // reap the aborted tasks so nothing outlives the run
                    while tasks.join_next().await.is_some() {}
                    warn!(aborted = report.aborted, "Grace window elapsed, aborting remaining iterations");
                    break;
                }
            }
        }

        report
    }
}

/// Receiving side of a [`StopCoordinator`]
#[derive(Clone)]
pub struct StopListener {
    receiver: watch::Receiver<Option<StopSignal>>,
}

impl StopListener {
    pub fn is_stopping(&self) -> bool {
        self.receiver.borrow().is_some()
    }

    /// Resolve once a stop has been requested
    pub async fn stopped(&mut self) -> StopSignal {
        loop {
            if let Some(signal) = *self.receiver.borrow_and_update() {
                return signal;
            }
            if self.receiver.changed().await.is_err() {
                // Coordinator dropped: nothing can stop us any more
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Shutdown error types
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ShutdownError {
    /// Stop already requested
    #[error("Stop already in progress")]
    AlreadyStopping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_stop_wins() {
        let coordinator = StopCoordinator::new(Duration::from_secs(1));
        assert!(!coordinator.is_stopping());

        assert!(coordinator.stop(StopSignal::Interrupt).is_ok());
        assert_eq!(coordinator.stop(StopSignal::Deadline), Err(ShutdownError::AlreadyStopping));
        assert_eq!(coordinator.signal(), Some(StopSignal::Interrupt));
    }

    #[tokio::test]
    async fn test_listener_sees_stop_requested_before_subscribing() {
        let coordinator = StopCoordinator::new(Duration::from_secs(1));
        coordinator.stop(StopSignal::Deadline).unwrap();

        let mut listener = coordinator.subscribe();
        assert!(listener.is_stopping());
        assert_eq!(listener.stopped().await, StopSignal::Deadline);
    }

    #[tokio::test]
    async fn test_listener_wakes_on_stop() {
        let coordinator = Arc::new(StopCoordinator::new(Duration::from_secs(1)));
        let mut listener = coordinator.subscribe();

        let handle = tokio::spawn(async move { listener.stopped().await });
        tokio::task::yield_now().await;
        coordinator.stop(StopSignal::Interrupt).unwrap();

        assert_eq!(handle.await.unwrap(), StopSignal::Interrupt);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_waits_for_tasks_within_grace() {
        let coordinator = StopCoordinator::new(Duration::from_secs(30));
        let mut tasks = JoinSet::new();
        for ms in [100, 500, 2_000] {
            tasks.spawn(async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            });
        }

        let report = coordinator.drain(&mut tasks).await;
        assert_eq!(report, DrainReport { finished: 3, aborted: 0, panicked: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_aborts_after_grace() {
        let coordinator = StopCoordinator::new(Duration::from_secs(1));
        let mut tasks = JoinSet::new();
        tasks.spawn(async { tokio::time::sleep(Duration::from_millis(10)).await });
        tasks.spawn(async { tokio::time::sleep(Duration::from_secs(60)).await });
        tasks.spawn(async { tokio::time::sleep(Duration::from_secs(60)).await });

        let start = tokio::time::Instant::now();
        let report = coordinator.drain(&mut tasks).await;

        assert_eq!(report.finished, 1);
        assert_eq!(report.aborted, 2);
        assert!(tasks.is_empty());
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
