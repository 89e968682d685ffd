//! gRPC functionality for claimbench
//!
//! The channel-based claim submitter keeps one persistent connection per
//! virtual user. A failed call drops the connection and reconnects exactly
//! once; a failed reconnect leaves the submitter disconnected until its next
//! submission.

pub mod client;
pub mod error;
pub mod proto;
pub mod submitter;
pub mod transport;

pub use client::ClaimsServiceClient;
pub use error::GrpcError;
pub use proto::{SubmitClaimRequest, SubmitClaimResponse};
pub use submitter::{ConnectionState, GrpcSubmitter, GrpcSubmitterFactory};
pub use transport::{RpcTransport, TonicTransport};
