//! REST claim submission (`POST {base_url}/claims`)

use crate::config::HttpClientConfig;
use crate::errors::HttpError;
use async_trait::async_trait;
use claimbench_core::{ClaimPayload, ClaimSubmitter, Protocol, SubmitOutcome, SubmitterFactory};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};
use url::Url;

/// Stateless HTTP submitter; cloning shares the underlying connection pool
#[derive(Debug, Clone)]
pub struct HttpSubmitter {
    client: Client,
    claims_url: Url,
    capture_response_bodies: bool,
}

/// Subset of the created-claim response worth logging
#[derive(Debug, Deserialize)]
struct CreatedClaim {
    id: Option<serde_json::Value>,
}

impl HttpSubmitter {
    pub fn new(client: Client, base_url: &str, capture_response_bodies: bool) -> Result<Self, HttpError> {
        Ok(Self {
            client,
            claims_url: claims_url(base_url)?,
            capture_response_bodies,
        })
    }

    pub fn claims_url(&self) -> &Url {
        &self.claims_url
    }

    async fn log_created_claim(response: reqwest::Response) {
        match response.json::<CreatedClaim>().await {
            Ok(CreatedClaim { id: Some(id) }) => debug!(claim_id = %id, "Claim created"),
            Ok(CreatedClaim { id: None }) => debug!("Claim created without an id in the response"),
            Err(e) => debug!(error = %e, "Could not read created claim body"),
        }
    }
}

#[async_trait]
impl ClaimSubmitter for HttpSubmitter {
    async fn submit(&mut self, payload: &ClaimPayload, timeout: Duration) -> SubmitOutcome {
        let start = Instant::now();
        let result = self
            .client
            .post(self.claims_url.clone())
            .json(payload)
            .timeout(timeout)
            .send()
            .await;
        let latency = start.elapsed();

        match result {
            Ok(response) => {
                let status = response.status();
                trace!(status = status.as_u16(), latency_ms = latency.as_millis() as u64, "Claim submitted");
                if !status.is_success() {
                    debug!(status = status.as_u16(), "Claim rejected");
                    return SubmitOutcome::failure(latency);
                }
                if self.capture_response_bodies {
                    Self::log_created_claim(response).await;
                }
                SubmitOutcome::success(latency)
            }
            Err(e) => {
                debug!(error = %e, timeout = e.is_timeout(), "Claim submission failed");
                SubmitOutcome::failure(latency)
            }
        }
    }

    fn protocol(&self) -> Protocol {
        Protocol::Http
    }
}

/// Hands every virtual user a clone of one submitter
#[derive(Debug, Clone)]
pub struct HttpSubmitterFactory {
    submitter: HttpSubmitter,
}

impl HttpSubmitterFactory {
    pub fn new(config: &HttpClientConfig, base_url: &str) -> Result<Self, HttpError> {
        let client = config.build_client()?;
        Ok(Self {
            submitter: HttpSubmitter::new(client, base_url, config.capture_response_bodies)?,
        })
    }

    /// A submitter outside any virtual user, e.g. for the correlation engine
    pub fn submitter(&self) -> HttpSubmitter {
        self.submitter.clone()
    }
}

impl SubmitterFactory for HttpSubmitterFactory {
    fn create(&self, _vu_id: u64) -> Box<dyn ClaimSubmitter> {
        Box::new(self.submitter.clone())
    }

    fn protocol(&self) -> Protocol {
        Protocol::Http
    }
}

fn claims_url(base_url: &str) -> Result<Url, HttpError> {
    let raw = format!("{}/claims", base_url.trim_end_matches('/'));
    Url::parse(&raw).map_err(|e| HttpError::invalid_url(&raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimbench_core::{CommunicationPattern, PayloadGenerator, VuIdentity};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> ClaimPayload {
        PayloadGenerator::new(
            vec!["p-1".to_string()],
            vec!["c-1".to_string()],
            CommunicationPattern::Rest,
        )
        .unwrap()
        .build(&VuIdentity::new(1, 0, "test"))
    }

    fn submitter(server: &MockServer, capture: bool) -> HttpSubmitter {
        HttpSubmitter::new(Client::new(), &server.uri(), capture).unwrap()
    }

    #[test]
    fn test_claims_url() {
        assert_eq!(
            claims_url("http://claim-service:8080/").unwrap().as_str(),
            "http://claim-service:8080/claims"
        );
        assert_eq!(
            claims_url("http://gateway/api").unwrap().as_str(),
            "http://gateway/api/claims"
        );
        assert!(claims_url("not a url").is_err());
    }

    #[tokio::test]
    async fn test_created_claim_is_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/claims"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(serde_json::json!({
                "policyId": "p-1",
                "customerId": "c-1",
                "reportedAmount": 1000.0
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "claim-1"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let outcome = submitter(&mock_server, true)
            .submit(&payload(), Duration::from_secs(5))
            .await;
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn test_server_error_is_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/claims"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let outcome = submitter(&mock_server, false)
            .submit(&payload(), Duration::from_secs(5))
            .await;
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn test_timeout_is_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/claims"))
            .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let outcome = submitter(&mock_server, false)
            .submit(&payload(), Duration::from_millis(50))
            .await;
        assert!(!outcome.success);
        assert!(outcome.latency < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_failure() {
        let mock_server = MockServer::start().await;
        let uri = mock_server.uri();
        drop(mock_server);

        let mut submitter = HttpSubmitter::new(Client::new(), &uri, false).unwrap();
        let outcome = submitter.submit(&payload(), Duration::from_secs(2)).await;
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn test_factory_creates_http_submitters() {
        let factory = HttpSubmitterFactory::new(&HttpClientConfig::default(), "http://localhost:1").unwrap();
        let submitter = factory.create(7);
        assert_eq!(submitter.protocol(), Protocol::Http);
        assert_eq!(factory.protocol(), Protocol::Http);
    }
}
