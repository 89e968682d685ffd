//! Virtual users and the arrival-rate VU pool

use crate::error::SchedulerError;
use claimbench_core::{ClaimSubmitter, SubmitterFactory};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// One simulated client. Owns its submitter, and therefore its connection,
/// for its whole lifetime.
pub struct VirtualUser {
    pub id: u64,
    pub submitter: Box<dyn ClaimSubmitter>,
    /// Iterations this VU has run
    pub iterations: u64,
}

impl VirtualUser {
    pub fn new(id: u64, factory: &dyn SubmitterFactory) -> Self {
        Self {
            id,
            submitter: factory.create(id),
            iterations: 0,
        }
    }
}

impl std::fmt::Debug for VirtualUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualUser")
            .field("id", &self.id)
            .field("protocol", &self.submitter.protocol())
            .field("iterations", &self.iterations)
            .finish()
    }
}

/// Hands a finished VU back to its pool
#[derive(Clone)]
pub struct VuReturn {
    sender: mpsc::UnboundedSender<VirtualUser>,
}

impl VuReturn {
    pub fn release(&self, vu: VirtualUser) {
        // the pool is gone once the run has ended; the VU is simply dropped
        let _ = self.sender.send(vu);
    }
}

/// Pool of idle virtual users that grows on demand up to `max_vus`
pub struct VuPool {
    factory: Arc<dyn SubmitterFactory>,
    idle: mpsc::UnboundedReceiver<VirtualUser>,
    returns: VuReturn,
    allocated: u64,
    max_vus: u64,
    phase: String,
}

impl VuPool {
    /// Create the pool with `preallocated` idle VUs. Creating a VU never
    /// opens a connection.
    pub fn new(
        phase: impl Into<String>,
        factory: Arc<dyn SubmitterFactory>,
        preallocated: u64,
        max_vus: u64,
    ) -> Self {
        let (sender, idle) = mpsc::unbounded_channel();
        let mut pool = Self {
            factory,
            idle,
            returns: VuReturn { sender },
            allocated: 0,
            max_vus: max_vus.max(preallocated),
            phase: phase.into(),
        };

        for _ in 0..preallocated {
            let vu = pool.allocate();
            pool.returns.release(vu);
        }
        pool
    }

    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    pub fn max_vus(&self) -> u64 {
        self.max_vus
    }

    pub fn returns(&self) -> VuReturn {
        self.returns.clone()
    }

    /// Take an idle VU, growing the pool if none is idle.
    ///
    /// `elapsed` and `dispatched` only feed the overload diagnostic.
    pub fn acquire(&mut self, elapsed: Duration, dispatched: u64) -> Result<VirtualUser, SchedulerError> {
        if let Ok(vu) = self.idle.try_recv() {
            return Ok(vu);
        }

        if self.allocated < self.max_vus {
            let vu = self.allocate();
            debug!(phase = %self.phase, vu = vu.id, allocated = self.allocated, "Grew virtual user pool");
            return Ok(vu);
        }

        Err(SchedulerError::CapacityExceeded {
            phase: self.phase.clone(),
            max_vus: self.max_vus,
            elapsed,
            dispatched,
        })
    }

    fn allocate(&mut self) -> VirtualUser {
        self.allocated += 1;
        VirtualUser::new(self.allocated, self.factory.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingFactory;

    #[test]
    fn test_preallocates_without_connecting() {
        let factory = Arc::new(CountingFactory::default());
        let pool = VuPool::new("test", factory.clone(), 3, 5);

        assert_eq!(pool.allocated(), 3);
        assert_eq!(factory.created(), 3);
        assert_eq!(factory.submissions(), 0);
    }

    #[test]
    fn test_reuses_idle_before_growing() {
        let factory = Arc::new(CountingFactory::default());
        let mut pool = VuPool::new("test", factory.clone(), 1, 2);

        let first = pool.acquire(Duration::ZERO, 0).unwrap();
        assert_eq!(first.id, 1);
        pool.returns().release(first);

        let again = pool.acquire(Duration::ZERO, 1).unwrap();
        assert_eq!(again.id, 1);
        assert_eq!(pool.allocated(), 1);
    }

    #[test]
    fn test_grows_to_max_then_fails() {
        let factory = Arc::new(CountingFactory::default());
        let mut pool = VuPool::new("warmup", factory, 1, 2);

        let _a = pool.acquire(Duration::ZERO, 0).unwrap();
        let b = pool.acquire(Duration::ZERO, 1).unwrap();
        assert_eq!(b.id, 2);

        match pool.acquire(Duration::from_secs(3), 2) {
            Err(SchedulerError::CapacityExceeded { phase, max_vus, dispatched, .. }) => {
                assert_eq!(phase, "warmup");
                assert_eq!(max_vus, 2);
                assert_eq!(dispatched, 2);
            }
            other => panic!("expected capacity error, got {:?}", other.map(|vu| vu.id)),
        }
    }
}
