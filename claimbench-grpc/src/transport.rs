//! Connection capability behind the gRPC submitter

use crate::client::ClaimsServiceClient;
use crate::error::GrpcError;
use crate::proto::SubmitClaimRequest;
use async_trait::async_trait;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};

/// Opens connections and performs calls over them.
///
/// The submitter owns the connection; the transport only knows how to make
/// and use one.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    type Connection: Send + 'static;

    /// Address used in logs
    fn target(&self) -> &str;

    async fn connect(&self) -> Result<Self::Connection, GrpcError>;

    async fn submit_claim(
        &self,
        connection: &mut Self::Connection,
        request: SubmitClaimRequest,
        timeout: Duration,
    ) -> Result<(), GrpcError>;
}

/// Plaintext HTTP/2 transport built on tonic
#[derive(Debug, Clone)]
pub struct TonicTransport {
    target: String,
    endpoint: Endpoint,
}

impl TonicTransport {
    /// `target` is `host:port`; connections are plaintext
    pub fn new(target: &str, connect_timeout: Duration) -> Result<Self, GrpcError> {
        let endpoint = Endpoint::from_shared(format!("http://{}", target))
            .map_err(|e| GrpcError::InvalidTarget {
                target: target.to_string(),
                message: e.to_string(),
            })?
            .connect_timeout(connect_timeout);
        Ok(Self {
            target: target.to_string(),
            endpoint,
        })
    }
}

#[async_trait]
impl RpcTransport for TonicTransport {
    type Connection = ClaimsServiceClient<Channel>;

    fn target(&self) -> &str {
        &self.target
    }

    async fn connect(&self) -> Result<Self::Connection, GrpcError> {
        ClaimsServiceClient::connect(self.endpoint.clone())
            .await
            .map_err(|e| GrpcError::Connect {
                target: self.target.clone(),
                message: e.to_string(),
            })
    }

    async fn submit_claim(
        &self,
        connection: &mut Self::Connection,
        request: SubmitClaimRequest,
        timeout: Duration,
    ) -> Result<(), GrpcError> {
        let mut request = tonic::Request::new(request);
        request.set_timeout(timeout);

        match tokio::time::timeout(timeout, connection.submit_claim(request)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(status)) => Err(status.into()),
            Err(_) => Err(GrpcError::Status {
                code: tonic::Code::DeadlineExceeded,
                message: format!("no response within {:?}", timeout),
            }),
        }
    }
}
