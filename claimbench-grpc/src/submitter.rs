//! Per-VU gRPC submitter with failure-triggered reconnect

use crate::error::GrpcError;
use crate::proto::SubmitClaimRequest;
use crate::transport::RpcTransport;
use async_trait::async_trait;
use claimbench_core::{ClaimPayload, ClaimSubmitter, Protocol, SubmitOutcome, SubmitterFactory};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Connection handle state owned by one virtual user
#[derive(Debug)]
pub enum ConnectionState<C> {
    Disconnected,
    Connected(C),
}

impl<C> ConnectionState<C> {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }
}

/// Submits claims over a connection that lives as long as its virtual user.
///
/// - The first submission connects lazily; if that fails the submission is
///   reported as failed and nothing is retried.
/// - A failed call drops the connection and makes exactly one reconnect
///   attempt. If the reconnect fails too, the submitter stays disconnected.
pub struct GrpcSubmitter<T: RpcTransport> {
    transport: Arc<T>,
    state: ConnectionState<T::Connection>,
    vu_id: u64,
}

impl<T: RpcTransport> GrpcSubmitter<T> {
    pub fn new(transport: Arc<T>, vu_id: u64) -> Self {
        Self {
            transport,
            state: ConnectionState::Disconnected,
            vu_id,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    async fn ensure_connected(&mut self) -> Result<&mut T::Connection, GrpcError> {
        if !self.state.is_connected() {
            let connection = self.transport.connect().await?;
            debug!(vu = self.vu_id, target = self.transport.target(), "gRPC channel connected");
            self.state = ConnectionState::Connected(connection);
        }
        match &mut self.state {
            ConnectionState::Connected(connection) => Ok(connection),
            ConnectionState::Disconnected => Err(GrpcError::Connect {
                target: self.transport.target().to_string(),
                message: "not connected".to_string(),
            }),
        }
    }

    async fn reconnect_once(&mut self) {
        self.state = ConnectionState::Disconnected;
        match self.transport.connect().await {
            Ok(connection) => {
                warn!(vu = self.vu_id, target = self.transport.target(), "gRPC channel reconnected after failed call");
                self.state = ConnectionState::Connected(connection);
            }
            Err(e) => {
                warn!(vu = self.vu_id, error = %e, "gRPC reconnect failed, staying disconnected");
            }
        }
    }
}

#[async_trait]
impl<T: RpcTransport> ClaimSubmitter for GrpcSubmitter<T> {
    async fn submit(&mut self, payload: &ClaimPayload, timeout: Duration) -> SubmitOutcome {
        let connect_start = Instant::now();
        let transport = Arc::clone(&self.transport);
        let connection = match self.ensure_connected().await {
            Ok(connection) => connection,
            Err(e) => {
                warn!(vu = self.vu_id, error = %e, "gRPC connect failed");
                return SubmitOutcome::failure(connect_start.elapsed());
            }
        };

        let start = Instant::now();
        let result = transport
            .submit_claim(connection, SubmitClaimRequest::from(payload), timeout)
            .await;
        let latency = start.elapsed();

        match result {
            Ok(()) => SubmitOutcome::success(latency),
            Err(e) => {
                debug!(vu = self.vu_id, error = %e, "gRPC SubmitClaim failed");
                self.reconnect_once().await;
                SubmitOutcome::failure(latency)
            }
        }
    }

    fn protocol(&self) -> Protocol {
        Protocol::Grpc
    }
}

/// Gives each virtual user its own, initially disconnected, submitter
pub struct GrpcSubmitterFactory<T: RpcTransport> {
    transport: Arc<T>,
}

impl<T: RpcTransport> GrpcSubmitterFactory<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }
}

impl<T: RpcTransport> SubmitterFactory for GrpcSubmitterFactory<T> {
    fn create(&self, vu_id: u64) -> Box<dyn ClaimSubmitter> {
        Box::new(GrpcSubmitter::new(Arc::clone(&self.transport), vu_id))
    }

    fn protocol(&self) -> Protocol {
        Protocol::Grpc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimbench_core::{CommunicationPattern, PayloadGenerator, VuIdentity};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted transport: queued outcomes are consumed in order, an empty
    /// queue means success
    #[derive(Default)]
    struct ScriptedTransport {
        connects: AtomicUsize,
        calls: AtomicUsize,
        connect_results: Mutex<VecDeque<bool>>,
        call_results: Mutex<VecDeque<bool>>,
    }

    impl ScriptedTransport {
        fn with_script(connects: &[bool], calls: &[bool]) -> Self {
            Self {
                connect_results: Mutex::new(connects.iter().copied().collect()),
                call_results: Mutex::new(calls.iter().copied().collect()),
                ..Default::default()
            }
        }

        fn connects(&self) -> usize {
            self.connects.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RpcTransport for ScriptedTransport {
        type Connection = usize;

        fn target(&self) -> &str {
            "scripted:0"
        }

        async fn connect(&self) -> Result<usize, GrpcError> {
            let n = self.connects.fetch_add(1, Ordering::SeqCst);
            let ok = self.connect_results.lock().unwrap().pop_front().unwrap_or(true);
            if ok {
                Ok(n)
            } else {
                Err(GrpcError::Connect {
                    target: "scripted:0".to_string(),
                    message: "refused".to_string(),
                })
            }
        }

        async fn submit_claim(
            &self,
            _connection: &mut usize,
            _request: SubmitClaimRequest,
            _timeout: Duration,
        ) -> Result<(), GrpcError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let ok = self.call_results.lock().unwrap().pop_front().unwrap_or(true);
            if ok {
                Ok(())
            } else {
                Err(GrpcError::Status {
                    code: tonic::Code::Unavailable,
                    message: "down".to_string(),
                })
            }
        }
    }

    fn payload() -> ClaimPayload {
        PayloadGenerator::new(vec!["p".into()], vec!["c".into()], CommunicationPattern::Grpc)
            .unwrap()
            .build(&VuIdentity::new(1, 0, "test"))
    }

    const TIMEOUT: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn test_connects_lazily_and_reuses_channel() {
        let transport = Arc::new(ScriptedTransport::default());
        let mut submitter = GrpcSubmitter::new(Arc::clone(&transport), 1);
        assert_eq!(transport.connects(), 0);
        assert!(!submitter.is_connected());

        for _ in 0..3 {
            assert!(submitter.submit(&payload(), TIMEOUT).await.success);
        }
        assert_eq!(transport.connects(), 1);
        assert!(submitter.is_connected());
    }

    #[tokio::test]
    async fn test_failed_call_reconnects_exactly_once() {
        let transport = Arc::new(ScriptedTransport::with_script(&[], &[true, false]));
        let mut submitter = GrpcSubmitter::new(Arc::clone(&transport), 1);

        assert!(submitter.submit(&payload(), TIMEOUT).await.success);
        assert!(!submitter.submit(&payload(), TIMEOUT).await.success);
        // lazy connect plus one reconnect
        assert_eq!(transport.connects(), 2);
        assert!(submitter.is_connected());

        assert!(submitter.submit(&payload(), TIMEOUT).await.success);
        assert_eq!(transport.connects(), 2);
    }

    #[tokio::test]
    async fn test_failed_reconnect_stays_disconnected() {
        // initial connect ok, reconnect refused
        let transport = Arc::new(ScriptedTransport::with_script(&[true, false], &[false]));
        let mut submitter = GrpcSubmitter::new(Arc::clone(&transport), 1);

        assert!(!submitter.submit(&payload(), TIMEOUT).await.success);
        assert_eq!(transport.connects(), 2);
        assert!(!submitter.is_connected());
    }

    #[tokio::test]
    async fn test_failed_lazy_connect_is_reported_without_retry() {
        let transport = Arc::new(ScriptedTransport::with_script(&[false], &[]));
        let mut submitter = GrpcSubmitter::new(Arc::clone(&transport), 1);

        assert!(!submitter.submit(&payload(), TIMEOUT).await.success);
        assert_eq!(transport.connects(), 1);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);

        // the next submission connects again
        assert!(submitter.submit(&payload(), TIMEOUT).await.success);
        assert_eq!(transport.connects(), 2);
    }

    #[tokio::test]
    async fn test_factory_creates_independent_submitters() {
        let factory = GrpcSubmitterFactory::new(ScriptedTransport::default());
        let mut first = factory.create(1);
        let mut second = factory.create(2);
        assert_eq!(factory.protocol(), Protocol::Grpc);

        assert!(first.submit(&payload(), TIMEOUT).await.success);
        assert!(second.submit(&payload(), TIMEOUT).await.success);
        // one channel per virtual user
        assert_eq!(factory.transport.connects(), 2);
    }
}
