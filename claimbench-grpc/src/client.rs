//! Client stub for `claims.ClaimsService` in the shape `tonic-build` generates

use crate::proto::{SubmitClaimRequest, SubmitClaimResponse};
use tonic::codegen::{http, Body, Bytes, StdError};

const SUBMIT_CLAIM_PATH: &str = "/claims.ClaimsService/SubmitClaim";

#[derive(Debug, Clone)]
pub struct ClaimsServiceClient<T> {
    inner: tonic::client::Grpc<T>,
}

impl ClaimsServiceClient<tonic::transport::Channel> {
    /// Open a connection through `endpoint`
    pub async fn connect(
        endpoint: tonic::transport::Endpoint,
    ) -> Result<Self, tonic::transport::Error> {
        let channel = endpoint.connect().await?;
        Ok(Self::new(channel))
    }
}

impl<T> ClaimsServiceClient<T>
where
    T: tonic::client::GrpcService<tonic::body::BoxBody>,
    T::Error: Into<StdError>,
    T::ResponseBody: Body<Data = Bytes> + Send + 'static,
    <T::ResponseBody as Body>::Error: Into<StdError> + Send,
{
    pub fn new(inner: T) -> Self {
        Self {
            inner: tonic::client::Grpc::new(inner),
        }
    }

    pub async fn submit_claim(
        &mut self,
        request: impl tonic::IntoRequest<SubmitClaimRequest>,
    ) -> Result<tonic::Response<SubmitClaimResponse>, tonic::Status> {
        self.inner.ready().await.map_err(|e| {
            tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
        })?;
        let codec = tonic::codec::ProstCodec::default();
        let path = http::uri::PathAndQuery::from_static(SUBMIT_CLAIM_PATH);
        self.inner.unary(request.into_request(), path, codec).await
    }
}
