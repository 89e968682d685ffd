//! Prometheus instant-query client used as the counter oracle

use crate::errors::HttpError;
use async_trait::async_trait;
use claimbench_core::{CounterOracle, OracleError};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::trace;
use url::Url;

/// Downstream consumer whose success counter is observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerSource {
    Policy,
    Customer,
}

impl ConsumerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumerSource::Policy => "policy",
            ConsumerSource::Customer => "customer",
        }
    }
}

impl fmt::Display for ConsumerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PromQL for the number of messages `source` has consumed successfully
pub fn consumer_success_query(namespace: &str, source: ConsumerSource) -> String {
    format!(
        "sum({}_kafka_consumer_events_total{{source=\"{}\",outcome=\"success\"}})",
        namespace, source
    )
}

/// Envelope returned by `GET /api/v1/query`
#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<QuerySample>,
}

/// One instant-vector sample: `value` is `[<unix time>, "<value>"]`
#[derive(Debug, Deserialize)]
struct QuerySample {
    value: (f64, String),
}

/// Counter oracle backed by the Prometheus HTTP API
#[derive(Debug, Clone)]
pub struct PrometheusOracle {
    client: Client,
    query_url: Url,
}

impl PrometheusOracle {
    pub fn new(prometheus_url: &str, timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(client, prometheus_url)
    }

    pub fn with_client(client: Client, prometheus_url: &str) -> Result<Self, HttpError> {
        let raw = format!("{}/api/v1/query", prometheus_url.trim_end_matches('/'));
        let query_url = Url::parse(&raw).map_err(|e| HttpError::invalid_url(&raw, e))?;
        Ok(Self { client, query_url })
    }
}

#[async_trait]
impl CounterOracle for PrometheusOracle {
    async fn query_scalar(&self, expression: &str) -> Result<f64, OracleError> {
        let response = self
            .client
            .get(self.query_url.clone())
            .query(&[("query", expression)])
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status {
                status: status.as_u16(),
            });
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;
        let value = scalar_from_response(body)?;
        trace!(query = expression, value, "Oracle query answered");
        Ok(value)
    }
}

/// First sample's value, `0.0` when no series matches
fn scalar_from_response(body: QueryResponse) -> Result<f64, OracleError> {
    if body.status != "success" {
        return Err(OracleError::Query(
            body.error.unwrap_or_else(|| format!("status {}", body.status)),
        ));
    }

    let data = body
        .data
        .ok_or_else(|| OracleError::Malformed("missing data".to_string()))?;

    let Some(sample) = data.result.into_iter().next() else {
        return Ok(0.0);
    };

    let raw = sample.value.1;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(OracleError::Malformed(format!("non-numeric sample value '{}'", raw))),
    }
}
