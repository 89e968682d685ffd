//! E2E probe for the event-driven pattern, correlating submissions with
//! consumer counters served by a mocked Prometheus

use anyhow::Result;
use claimbench_config::ClaimbenchConfig;
use claimbench_core::{CommunicationPattern, MetricName};
use claimbench_execution::{Scenario, ScenarioRunner};
use claimbench_output::SummarySink;
use claimbench_resilience::StopCoordinator;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Accepts claims and counts them as consumed by both downstream services
struct ConsumingClaimService {
    consumed: Arc<AtomicU64>,
}

impl Respond for ConsumingClaimService {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.consumed.fetch_add(1, Ordering::SeqCst);
        ResponseTemplate::new(202)
    }
}

/// Answers every instant query with the current counter value
struct CounterQuery {
    value: Arc<AtomicU64>,
}

impl Respond for CounterQuery {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let value = self.value.load(Ordering::SeqCst);
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [{"metric": {}, "value": [1700000000.0, value.to_string()]}]
            }
        }))
    }
}

async fn mock_services(consumed: Arc<AtomicU64>, reported: Arc<AtomicU64>) -> (MockServer, MockServer) {
    let claim_service = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/claims"))
        .respond_with(ConsumingClaimService { consumed })
        .mount(&claim_service)
        .await;

    let prometheus = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(CounterQuery { value: reported })
        .mount(&prometheus)
        .await;

    (claim_service, prometheus)
}

fn event_driven_config(base_url: &str, prometheus_url: &str) -> ClaimbenchConfig {
    let mut config = ClaimbenchConfig::default();
    config.target.pattern = CommunicationPattern::EventDriven;
    config.target.base_url = base_url.to_string();
    config.target.http_timeout = Duration::from_secs(2);
    config.probe.vus = 1;
    config.probe.rate = 2.0;
    config.probe.duration = Duration::from_secs(1);
    config.e2e.enabled = true;
    config.e2e.prometheus_url = prometheus_url.to_string();
    config.e2e.timeout = Duration::from_millis(400);
    config.e2e.poll_interval = Duration::from_millis(50);
    config
}

fn runner(config: ClaimbenchConfig, sink: Arc<SummarySink>) -> Result<ScenarioRunner> {
    let stop = Arc::new(StopCoordinator::new(Duration::from_secs(5)));
    Ok(ScenarioRunner::new(config, sink, stop)?)
}

#[tokio::test]
async fn test_consumed_claims_complete_end_to_end() -> Result<()> {
    let consumed = Arc::new(AtomicU64::new(0));
    let (claim_service, prometheus) = mock_services(consumed.clone(), consumed.clone()).await;
    let sink = Arc::new(SummarySink::new());

    let report = runner(event_driven_config(&claim_service.uri(), &prometheus.uri()), sink.clone())?
        .run(Scenario::E2eProbe)
        .await?;

    let iterations = report.completed();
    assert!(iterations >= 1);
    assert_eq!(consumed.load(Ordering::SeqCst), iterations);

    let summary = sink.summary();
    let e2e_failures = summary.rate(MetricName::E2eFailure).expect("e2e failure rate recorded");
    assert_eq!((e2e_failures.hits, e2e_failures.total), (0, iterations));
    assert_eq!(summary.trend(MetricName::E2eLatency).map(|t| t.count), Some(iterations));
    assert_eq!(summary.trend(MetricName::SubmitLatency).map(|t| t.count), Some(iterations));
    Ok(())
}

#[tokio::test]
async fn test_unconsumed_claims_time_out() -> Result<()> {
    let consumed = Arc::new(AtomicU64::new(0));
    // the counters stay put whatever is submitted
    let reported = Arc::new(AtomicU64::new(7));
    let (claim_service, prometheus) = mock_services(consumed.clone(), reported).await;
    let sink = Arc::new(SummarySink::new());

    let report = runner(event_driven_config(&claim_service.uri(), &prometheus.uri()), sink.clone())?
        .run(Scenario::E2eProbe)
        .await?;

    assert!(report.completed() >= 1);

    let summary = sink.summary();
    assert_eq!(summary.rate(MetricName::E2eFailure).map(|r| r.rate), Some(1.0));
    assert!(summary.get(MetricName::E2eLatency).is_none());
    // the submissions themselves succeeded
    assert_eq!(summary.rate(MetricName::SubmitFailure).map(|r| r.hits), Some(0));
    Ok(())
}

#[tokio::test]
async fn test_probe_refuses_unsafe_concurrency() -> Result<()> {
    let consumed = Arc::new(AtomicU64::new(0));
    let (claim_service, prometheus) = mock_services(consumed.clone(), consumed.clone()).await;
    let mut config = event_driven_config(&claim_service.uri(), &prometheus.uri());
    config.probe.vus = 3;

    let result = runner(config, Arc::new(SummarySink::new()))?
        .run(Scenario::E2eProbe)
        .await;

    assert!(matches!(
        result,
        Err(claimbench_execution::SchedulerError::UnsafeCorrelationConcurrency { vus: 3, max_vus: 1 })
    ));
    assert_eq!(consumed.load(Ordering::SeqCst), 0);
    Ok(())
}
