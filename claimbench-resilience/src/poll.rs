//! Bounded fixed-interval polling

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::trace;

/// Result of [`FixedIntervalPoller::poll_until`]
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    /// A check produced a value
    Ready { value: T, attempts: u32, elapsed: Duration },
    /// The deadline passed without a value
    TimedOut { attempts: u32, elapsed: Duration },
}

impl<T> PollOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Ready { attempts, .. } | PollOutcome::TimedOut { attempts, .. } => *attempts,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            PollOutcome::Ready { elapsed, .. } | PollOutcome::TimedOut { elapsed, .. } => *elapsed,
        }
    }
}

/// Runs a check at `0, interval, 2·interval, …` and once more exactly at the
/// timeout.
///
/// Ticks are anchored to the start, so a slow check does not shift later
/// ticks; ticks a slow check overran are skipped, never run back to back. A
/// single check is cut off once both its own interval and the overall
/// deadline have passed, and then counts as "no value yet".
#[derive(Debug, Clone, Copy)]
pub struct FixedIntervalPoller {
    interval: Duration,
    timeout: Duration,
}

impl FixedIntervalPoller {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            // a zero interval would spin
            interval: interval.max(Duration::from_millis(1)),
            timeout,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Poll `check` until it yields `Some`, or until the timeout elapses
    pub async fn poll_until<T, F, Fut>(&self, mut check: F) -> PollOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let start = Instant::now();
        let deadline = start + self.timeout;
        let mut attempts: u32 = 0;
        // grid index of the tick the current check started on
        let mut tick: u32 = 0;

        loop {
            attempts += 1;
            let check_deadline = (Instant::now() + self.interval).max(deadline);
            let result = timeout_at(check_deadline, check(attempts)).await.ok().flatten();

            if let Some(value) = result {
                return PollOutcome::Ready {
                    value,
                    attempts,
                    elapsed: start.elapsed(),
                };
            }

            let now = Instant::now();
            if now >= deadline {
                trace!(attempts, "Polling timed out");
                return PollOutcome::TimedOut {
                    attempts,
                    elapsed: now - start,
                };
            }

            tick = tick.saturating_add(1).max(ticks_elapsed(now - start, self.interval));
            let next_tick = self
                .interval
                .checked_mul(tick)
                .and_then(|offset| start.checked_add(offset))
                .map_or(deadline, |t| t.min(deadline));
            sleep_until(next_tick).await;
        }
    }
}

/// Index of the first tick at or after `elapsed`
fn ticks_elapsed(elapsed: Duration, interval: Duration) -> u32 {
    let index = elapsed.as_nanos().div_ceil(interval.as_nanos());
    u32::try_from(index).unwrap_or(u32::MAX)
}
