//! Load-shape schedulers
//!
//! [`ArrivalRateScheduler`] is the open model: iterations start on the
//! cadence of a [`RateProfile`] whatever the latency of earlier ones, taking
//! idle virtual users from a pool that grows up to its maximum. Running out
//! of virtual users is fatal for the run.
//!
//! [`ClosedModelScheduler`] is the closed model: a fixed set of virtual users
//! loop back to back, optionally paced towards a target period.
//!
//! Both honour the [`StopCoordinator`]: once the duration has elapsed or a
//! stop is requested no new iteration starts, and in-flight iterations get
//! the graceful-stop window before they are aborted and counted as
//! interrupted.

use crate::error::{SchedulerError, SchedulerResult};
use crate::iteration::Iteration;
use crate::pool::{VirtualUser, VuPool};
use crate::profile::RateProfile;
use claimbench_config::{ArrivalRateConfig, ProbeConfig, RampConfig};
use claimbench_core::{SubmitterFactory, VuIdentity};
use claimbench_resilience::{StopCoordinator, StopSignal};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tracing::{error, info};

/// Outcome of one scheduler run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Iterations started
    pub dispatched: u64,
    /// Iterations that ran to the end, successful or not
    pub completed: u64,
    /// Iterations aborted at the end of the grace window; incomplete, not failed
    pub interrupted: u64,
    pub vus_allocated: u64,
    pub elapsed: Duration,
    pub stopped_by: StopSignal,
}

impl RunStats {
    fn not_started(stopped_by: StopSignal) -> Self {
        Self {
            dispatched: 0,
            completed: 0,
            interrupted: 0,
            vus_allocated: 0,
            elapsed: Duration::ZERO,
            stopped_by,
        }
    }

    pub fn was_interrupted(&self) -> bool {
        self.stopped_by == StopSignal::Interrupt
    }
}

/// Open-model scheduler driven by a rate profile
#[derive(Debug, Clone)]
pub struct ArrivalRateScheduler {
    phase: String,
    profile: RateProfile,
    preallocated_vus: u64,
    max_vus: u64,
}

impl ArrivalRateScheduler {
    pub fn new(phase: impl Into<String>, profile: RateProfile, preallocated_vus: u64, max_vus: u64) -> Self {
        Self {
            phase: phase.into(),
            profile,
            preallocated_vus,
            max_vus: max_vus.max(preallocated_vus),
        }
    }

    /// Constant arrival rate
    pub fn constant(phase: impl Into<String>, config: &ArrivalRateConfig) -> SchedulerResult<Self> {
        let (preallocated, max) = pool_size(config.preallocated_vus, config.max_vus)?;
        Ok(Self::new(phase, RateProfile::from_arrival_config(config)?, preallocated, max))
    }

    /// Staged ramping arrival rate
    pub fn ramping(phase: impl Into<String>, config: &RampConfig) -> SchedulerResult<Self> {
        let (preallocated, max) = pool_size(config.preallocated_vus, config.max_vus)?;
        Ok(Self::new(phase, RateProfile::from_ramp_config(config)?, preallocated, max))
    }

    pub fn profile(&self) -> &RateProfile {
        &self.profile
    }

    pub async fn run<I: Iteration>(
        &self,
        iteration: Arc<I>,
        factory: Arc<dyn SubmitterFactory>,
        stop: &StopCoordinator,
        test_run: &str,
    ) -> SchedulerResult<RunStats> {
        let mut listener = stop.subscribe();
        if let Some(signal) = stop.signal() {
            info!(phase = %self.phase, %signal, "Run already stopping, phase skipped");
            return Ok(RunStats::not_started(signal));
        }

        let total = self.profile.total_duration();
        info!(
            phase = %self.phase,
            stages = self.profile.stages().len(),
            mode = %self.profile.mode(),
            duration = ?total,
            preallocated_vus = self.preallocated_vus,
            max_vus = self.max_vus,
            "Starting arrival-rate scheduler"
        );

        let mut pool = VuPool::new(self.phase.clone(), factory, self.preallocated_vus, self.max_vus);
        let completed = Arc::new(AtomicU64::new(0));
        let mut tasks = JoinSet::new();
        let start = Instant::now();
        let mut dispatched: u64 = 0;
        let mut stopped_by = StopSignal::Deadline;
        let mut next_arrival = Some(Duration::ZERO);

        while let Some(offset) = next_arrival {
            tokio::select! {
                biased;
                signal = listener.stopped() => {
                    stopped_by = signal;
                    break;
                }
                _ = sleep_until(start + offset) => {}
            }

            // reap finished iterations so the set does not grow with the run
            while let Some(result) = tasks.try_join_next() {
                if let Err(e) = result {
                    error!(phase = %self.phase, error = %e, "Iteration task failed");
                }
            }

            let mut vu = match pool.acquire(start.elapsed(), dispatched) {
                Ok(vu) => vu,
                Err(e) => {
                    error!(phase = %self.phase, error = %e, "Aborting run");
                    tasks.shutdown().await;
                    return Err(e);
                }
            };

            let identity = VuIdentity::new(vu.id, dispatched, test_run);
            dispatched += 1;

            let iteration = Arc::clone(&iteration);
            let completed = Arc::clone(&completed);
            let returns = pool.returns();
            tasks.spawn(async move {
                iteration.run(&mut vu, &identity).await;
                vu.iterations += 1;
                completed.fetch_add(1, Ordering::SeqCst);
                returns.release(vu);
            });

            next_arrival = self.profile.next_arrival(offset);
        }

        if stopped_by == StopSignal::Deadline {
            tokio::select! {
                biased;
                signal = listener.stopped() => stopped_by = signal,
                _ = sleep_until(start + total) => {}
            }
        }

        let drain = stop.drain(&mut tasks).await;
        let completed = completed.load(Ordering::SeqCst);
        let stats = RunStats {
            dispatched,
            completed,
            interrupted: dispatched.saturating_sub(completed),
            vus_allocated: pool.allocated(),
            elapsed: start.elapsed(),
            stopped_by,
        };

        info!(
            phase = %self.phase,
            dispatched = stats.dispatched,
            completed = stats.completed,
            interrupted = stats.interrupted,
            vus_allocated = stats.vus_allocated,
            panicked = drain.panicked,
            stopped_by = %stats.stopped_by,
            "Arrival-rate scheduler finished"
        );
        Ok(stats)
    }
}

fn pool_size(preallocated: u32, max: u32) -> SchedulerResult<(u64, u64)> {
    if preallocated == 0 {
        return Err(SchedulerError::Configuration(
            "at least one virtual user must be pre-allocated".to_string(),
        ));
    }
    if max < preallocated {
        return Err(SchedulerError::Configuration(format!(
            "max_vus ({}) must not be below preallocated_vus ({})",
            max, preallocated
        )));
    }
    Ok((preallocated as u64, max as u64))
}

/// Closed-model scheduler: `vus` virtual users looping for `duration`
#[derive(Debug, Clone)]
pub struct ClosedModelScheduler {
    phase: String,
    vus: u64,
    duration: Duration,
    pacing: Option<Duration>,
}

impl ClosedModelScheduler {
    pub fn new(phase: impl Into<String>, vus: u64, duration: Duration, pacing: Option<Duration>) -> Self {
        Self {
            phase: phase.into(),
            vus,
            duration,
            pacing,
        }
    }

    pub fn from_probe_config(phase: impl Into<String>, config: &ProbeConfig) -> SchedulerResult<Self> {
        if config.vus == 0 {
            return Err(SchedulerError::Configuration(
                "closed model needs at least one virtual user".to_string(),
            ));
        }
        Ok(Self::new(phase, config.vus as u64, config.duration, config.pacing_period()))
    }

    pub fn vus(&self) -> u64 {
        self.vus
    }

    pub async fn run<I: Iteration>(
        &self,
        iteration: Arc<I>,
        factory: Arc<dyn SubmitterFactory>,
        stop: &StopCoordinator,
        test_run: &str,
    ) -> SchedulerResult<RunStats> {
        let mut listener = stop.subscribe();
        if let Some(signal) = stop.signal() {
            info!(phase = %self.phase, %signal, "Run already stopping, phase skipped");
            return Ok(RunStats::not_started(signal));
        }

        info!(
            phase = %self.phase,
            vus = self.vus,
            duration = ?self.duration,
            pacing = ?self.pacing,
            "Starting closed-model scheduler"
        );

        let start = Instant::now();
        let deadline = start + self.duration;
        let dispatched = Arc::new(AtomicU64::new(0));
        let completed = Arc::new(AtomicU64::new(0));
        let mut tasks = JoinSet::new();

        for vu_id in 1..=self.vus {
            let mut vu = VirtualUser::new(vu_id, factory.as_ref());
            let mut listener = stop.subscribe();
            let iteration = Arc::clone(&iteration);
            let dispatched = Arc::clone(&dispatched);
            let completed = Arc::clone(&completed);
            let test_run = test_run.to_string();
            let pacing = self.pacing;

            tasks.spawn(async move {
                loop {
                    if Instant::now() >= deadline || listener.is_stopping() {
                        break;
                    }

                    let started = Instant::now();
                    let identity = VuIdentity::new(vu.id, dispatched.fetch_add(1, Ordering::SeqCst), &test_run);
                    iteration.run(&mut vu, &identity).await;
                    vu.iterations += 1;
                    completed.fetch_add(1, Ordering::SeqCst);

                    match pacing {
                        Some(period) => {
                            let wake = (started + period).min(deadline);
                            tokio::select! {
                                _ = sleep_until(wake) => {}
                                _ = listener.stopped() => break,
                            }
                        }
                        None => tokio::task::yield_now().await,
                    }
                }
            });
        }

        let stopped_by = tokio::select! {
            biased;
            signal = listener.stopped() => signal,
            _ = sleep_until(deadline) => StopSignal::Deadline,
        };

        let drain = stop.drain(&mut tasks).await;
        let dispatched = dispatched.load(Ordering::SeqCst);
        let completed = completed.load(Ordering::SeqCst);
        let stats = RunStats {
            dispatched,
            completed,
            interrupted: dispatched.saturating_sub(completed),
            vus_allocated: self.vus,
            elapsed: start.elapsed(),
            stopped_by,
        };

        info!(
            phase = %self.phase,
            dispatched = stats.dispatched,
            completed = stats.completed,
            interrupted = stats.interrupted,
            panicked = drain.panicked,
            stopped_by = %stats.stopped_by,
            "Closed-model scheduler finished"
        );
        Ok(stats)
    }
}
