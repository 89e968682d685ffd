//! Scenario drivers
//!
//! - **breakpoint**: a constant-rate warmup, then the staged ramp, each with
//!   its own VU pool. Submit metrics only.
//! - **constant-load**: one constant arrival-rate phase. Submit metrics only.
//! - **e2e-probe**: a closed model with few VUs measuring end-to-end latency,
//!   through the correlation engine for the event-driven pattern.

use crate::correlation::E2eCorrelator;
use crate::error::{SchedulerError, SchedulerResult};
use crate::iteration::{ProbeIteration, SubmitIteration};
use crate::scheduler::{ArrivalRateScheduler, ClosedModelScheduler, RunStats};
use claimbench_config::{ClaimbenchConfig, TargetConfig};
use claimbench_core::{
    CounterOracle, MetricsSink, PayloadGenerator, Protocol, SubmitterFactory, Tags, TestKind,
};
use claimbench_grpc::{GrpcSubmitterFactory, TonicTransport};
use claimbench_http::{HttpClientConfig, HttpSubmitterFactory, PrometheusOracle};
use claimbench_resilience::StopCoordinator;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Upper bound for a single oracle query
const ORACLE_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Breakpoint,
    ConstantLoad,
    E2eProbe,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Breakpoint => "breakpoint",
            Scenario::ConstantLoad => "constant-load",
            Scenario::E2eProbe => "e2e-probe",
        }
    }

    pub fn test_kind(&self) -> TestKind {
        match self {
            Scenario::Breakpoint => TestKind::Breakpoint,
            Scenario::ConstantLoad => TestKind::Constant,
            Scenario::E2eProbe => TestKind::E2e,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics of one scheduler phase
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseReport {
    pub name: String,
    pub stats: RunStats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub phases: Vec<PhaseReport>,
}

impl ScenarioReport {
    pub fn dispatched(&self) -> u64 {
        self.phases.iter().map(|p| p.stats.dispatched).sum()
    }

    pub fn completed(&self) -> u64 {
        self.phases.iter().map(|p| p.stats.completed).sum()
    }

    pub fn interrupted(&self) -> u64 {
        self.phases.iter().map(|p| p.stats.interrupted).sum()
    }

    pub fn was_interrupted(&self) -> bool {
        self.phases.iter().any(|p| p.stats.was_interrupted())
    }
}

/// Submitter factory for the transport `target.pattern` selects
pub fn build_submitter_factory(target: &TargetConfig) -> SchedulerResult<Arc<dyn SubmitterFactory>> {
    match target.pattern.protocol() {
        Protocol::Http => {
            let factory = HttpSubmitterFactory::new(&HttpClientConfig::from(target), &target.base_url)?;
            Ok(Arc::new(factory))
        }
        Protocol::Grpc => {
            let transport = TonicTransport::new(&target.grpc_target, target.grpc_timeout)?;
            Ok(Arc::new(GrpcSubmitterFactory::new(transport)))
        }
    }
}

/// Runs scenarios against one configured system under test
pub struct ScenarioRunner {
    config: ClaimbenchConfig,
    factory: Arc<dyn SubmitterFactory>,
    oracle: Option<Arc<dyn CounterOracle>>,
    sink: Arc<dyn MetricsSink>,
    stop: Arc<StopCoordinator>,
}

impl ScenarioRunner {
    /// Build the transports the configuration selects
    pub fn new(
        config: ClaimbenchConfig,
        sink: Arc<dyn MetricsSink>,
        stop: Arc<StopCoordinator>,
    ) -> SchedulerResult<Self> {
        let factory = build_submitter_factory(&config.target)?;
        let oracle: Option<Arc<dyn CounterOracle>> = if correlation_enabled(&config) {
            let timeout = ORACLE_QUERY_TIMEOUT.min(config.e2e.timeout);
            Some(Arc::new(PrometheusOracle::new(&config.e2e.prometheus_url, timeout)?))
        } else {
            None
        };

        Ok(Self {
            config,
            factory,
            oracle,
            sink,
            stop,
        })
    }

    /// Replace the submitter factory
    pub fn with_factory(mut self, factory: Arc<dyn SubmitterFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Replace the counter oracle
    pub fn with_oracle(mut self, oracle: Arc<dyn CounterOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn config(&self) -> &ClaimbenchConfig {
        &self.config
    }

    pub async fn run(&self, scenario: Scenario) -> SchedulerResult<ScenarioReport> {
        info!(
            %scenario,
            pattern = %self.config.target.pattern,
            protocol = %self.factory.protocol(),
            test_run = %self.config.run.test_run,
            "Starting scenario"
        );

        let phases = match scenario {
            Scenario::Breakpoint => self.breakpoint().await?,
            Scenario::ConstantLoad => self.constant_load().await?,
            Scenario::E2eProbe => self.e2e_probe().await?,
        };

        Ok(ScenarioReport { scenario, phases })
    }

    async fn breakpoint(&self) -> SchedulerResult<Vec<PhaseReport>> {
        let warmup = ArrivalRateScheduler::constant("warmup", &self.config.breakpoint.warmup)?;
        let ramp = ArrivalRateScheduler::ramping("ramp", &self.config.breakpoint.ramp)?;
        let iteration = Arc::new(self.submit_iteration(TestKind::Breakpoint)?);
        let test_run = &self.config.run.test_run;
        let warmup_window = warmup.profile().total_duration();

        // the ramp takes over at the warmup deadline while warmup iterations
        // still in flight drain alongside it
        let mut listener = self.stop.subscribe();
        let ramp_at_deadline = async {
            tokio::select! {
                biased;
                _ = listener.stopped() => {}
                _ = tokio::time::sleep(warmup_window) => {}
            }
            ramp.run(Arc::clone(&iteration), Arc::clone(&self.factory), &self.stop, test_run)
                .await
        };
        let (warmup_stats, ramp_stats) = tokio::try_join!(
            warmup.run(Arc::clone(&iteration), Arc::clone(&self.factory), &self.stop, test_run),
            ramp_at_deadline,
        )?;

        let mut phases = vec![PhaseReport {
            name: "warmup".to_string(),
            stats: warmup_stats,
        }];
        // interrupted before its deadline, so the ramp never started
        if warmup_stats.was_interrupted() {
            return Ok(phases);
        }
        phases.push(PhaseReport {
            name: "ramp".to_string(),
            stats: ramp_stats,
        });
        Ok(phases)
    }

    async fn constant_load(&self) -> SchedulerResult<Vec<PhaseReport>> {
        let scheduler = ArrivalRateScheduler::constant("constant", &self.config.constant_load)?;
        let iteration = Arc::new(self.submit_iteration(TestKind::Constant)?);

        let stats = scheduler
            .run(iteration, Arc::clone(&self.factory), &self.stop, &self.config.run.test_run)
            .await?;
        Ok(vec![PhaseReport {
            name: "constant".to_string(),
            stats,
        }])
    }

    async fn e2e_probe(&self) -> SchedulerResult<Vec<PhaseReport>> {
        let probe = &self.config.probe;
        let e2e = &self.config.e2e;
        let scheduler = ClosedModelScheduler::from_probe_config("probe", probe)?;

        let correlator = if correlation_enabled(&self.config) {
            if probe.vus > e2e.max_vus {
                return Err(SchedulerError::UnsafeCorrelationConcurrency {
                    vus: probe.vus,
                    max_vus: e2e.max_vus,
                });
            }
            let oracle = self.oracle.clone().ok_or_else(|| {
                SchedulerError::Configuration("E2E correlation is enabled but no oracle is configured".to_string())
            })?;
            Some(E2eCorrelator::new(
                oracle,
                &e2e.metrics_namespace,
                e2e.timeout,
                e2e.poll_interval,
            ))
        } else {
            if self.config.target.pattern.is_asynchronous() {
                warn!("E2E correlation disabled, the probe records submit metrics only");
            }
            None
        };

        let iteration = Arc::new(ProbeIteration::new(
            self.generator()?,
            Arc::clone(&self.sink),
            self.tags(TestKind::E2e),
            self.config.target.submit_timeout(),
            correlator,
        ));

        let stats = scheduler
            .run(iteration, Arc::clone(&self.factory), &self.stop, &self.config.run.test_run)
            .await?;
        Ok(vec![PhaseReport {
            name: "probe".to_string(),
            stats,
        }])
    }

    fn submit_iteration(&self, kind: TestKind) -> SchedulerResult<SubmitIteration> {
        Ok(SubmitIteration::new(
            self.generator()?,
            Arc::clone(&self.sink),
            self.tags(kind),
            self.config.target.submit_timeout(),
        ))
    }

    fn generator(&self) -> SchedulerResult<PayloadGenerator> {
        Ok(PayloadGenerator::new(
            self.config.data.policy_ids.clone(),
            self.config.data.customer_ids.clone(),
            self.config.target.pattern,
        )?)
    }

    fn tags(&self, kind: TestKind) -> Tags {
        Tags::submit_claim(self.config.target.pattern, self.config.run.test_run.clone(), kind)
    }
}

fn correlation_enabled(config: &ClaimbenchConfig) -> bool {
    config.e2e.enabled && config.target.pattern.is_asynchronous()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingFactory, RecordingSink, ScriptedOracle};
    use claimbench_config::StageConfig;
    use claimbench_core::{CommunicationPattern, MetricName};

    fn short_config(pattern: CommunicationPattern) -> ClaimbenchConfig {
        let mut config = ClaimbenchConfig::default();
        config.target.pattern = pattern;
        config.constant_load.rate = 5.0;
        config.constant_load.duration = Duration::from_secs(2);
        config.constant_load.preallocated_vus = 2;
        config.constant_load.max_vus = 4;
        config.breakpoint.warmup.rate = 2.0;
        config.breakpoint.warmup.duration = Duration::from_secs(1);
        config.breakpoint.warmup.preallocated_vus = 1;
        config.breakpoint.warmup.max_vus = 2;
        config.breakpoint.ramp.preallocated_vus = 1;
        config.breakpoint.ramp.max_vus = 4;
        config.breakpoint.ramp.stages = vec![
            StageConfig {
                target: 2.0,
                duration: Duration::from_secs(1),
            },
            StageConfig {
                target: 4.0,
                duration: Duration::from_secs(1),
            },
        ];
        config.probe.duration = Duration::from_secs(3);
        config.e2e.timeout = Duration::from_secs(2);
        config.e2e.poll_interval = Duration::from_millis(200);
        config
    }

    fn runner(config: ClaimbenchConfig, sink: Arc<RecordingSink>) -> ScenarioRunner {
        ScenarioRunner::new(config, sink, Arc::new(StopCoordinator::new(Duration::from_secs(5))))
            .unwrap()
            .with_factory(Arc::new(CountingFactory::with_latency(Duration::from_millis(20))))
    }

    #[tokio::test(start_paused = true)]
    async fn test_constant_load_runs_one_phase() {
        let sink = Arc::new(RecordingSink::default());
        let report = runner(short_config(CommunicationPattern::Rest), sink.clone())
            .run(Scenario::ConstantLoad)
            .await
            .unwrap();

        assert_eq!(report.phases.len(), 1);
        assert_eq!(report.dispatched(), 10);
        assert_eq!(report.completed(), 10);
        assert_eq!(sink.values(MetricName::SubmitLatency).len(), 10);
        assert!(sink.all().iter().all(|m| m.tags.test_kind == TestKind::Constant));
    }

    #[tokio::test(start_paused = true)]
    async fn test_breakpoint_runs_warmup_then_ramp() {
        let sink = Arc::new(RecordingSink::default());
        let report = runner(short_config(CommunicationPattern::Grpc), sink.clone())
            .run(Scenario::Breakpoint)
            .await
            .unwrap();

        let names: Vec<_> = report.phases.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["warmup", "ramp"]);
        assert_eq!(report.phases[0].stats.dispatched, 2);
        // 2/s for a second, then 4/s for a second
        assert_eq!(report.phases[1].stats.dispatched, 6);
        assert!(sink.all().iter().all(|m| m.tags.protocol == Protocol::Grpc));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ramp_starts_while_slow_warmup_drains() {
        let mut config = short_config(CommunicationPattern::Rest);
        config.breakpoint.ramp.max_vus = 8;
        let sink = Arc::new(RecordingSink::default());
        // warmup iterations run until 3.5s, well past the 1s warmup window
        let runner = runner(config, sink.clone())
            .with_factory(Arc::new(CountingFactory::with_latency(Duration::from_secs(3))));

        let start = tokio::time::Instant::now();
        let report = runner.run(Scenario::Breakpoint).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(report.phases[0].stats.dispatched, 2);
        assert_eq!(report.phases[1].stats.dispatched, 6);
        assert_eq!(report.completed(), 8);
        // ramp window 1s..3s, its last iteration done by 6s; waiting for the
        // warmup drain first would push the first ramp iteration to 6.5s
        assert!(elapsed <= Duration::from_secs(6), "elapsed {:?}", elapsed);
        assert!(report.phases[1].stats.elapsed <= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_breakpoint_interrupted_in_warmup_skips_ramp() {
        let stop = Arc::new(StopCoordinator::new(Duration::from_secs(5)));
        let runner = ScenarioRunner::new(
            short_config(CommunicationPattern::Rest),
            Arc::new(RecordingSink::default()),
            Arc::clone(&stop),
        )
        .unwrap()
        .with_factory(Arc::new(CountingFactory::with_latency(Duration::from_millis(20))));

        let trigger = Arc::clone(&stop);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.stop(claimbench_resilience::StopSignal::Interrupt).unwrap();
        });

        let start = tokio::time::Instant::now();
        let report = runner.run(Scenario::Breakpoint).await.unwrap();

        assert_eq!(report.phases.len(), 1);
        assert!(report.phases[0].stats.was_interrupted());
        assert_eq!(report.phases[0].stats.dispatched, 1);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_refuses_unsafe_correlation_concurrency() {
        let mut config = short_config(CommunicationPattern::EventDriven);
        config.probe.vus = 3;
        config.e2e.max_vus = 1;

        let result = runner(config, Arc::new(RecordingSink::default()))
            .with_oracle(Arc::new(ScriptedOracle::default()))
            .run(Scenario::E2eProbe)
            .await;
        assert!(matches!(
            result,
            Err(SchedulerError::UnsafeCorrelationConcurrency { vus: 3, max_vus: 1 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_probe_allows_more_vus() {
        let mut config = short_config(CommunicationPattern::Rest);
        config.probe.vus = 3;

        let sink = Arc::new(RecordingSink::default());
        let report = runner(config, sink.clone()).run(Scenario::E2eProbe).await.unwrap();

        // three VUs paced at 1/s for 3s
        assert_eq!(report.dispatched(), 9);
        assert_eq!(sink.values(MetricName::E2eLatency), vec![20.0; 9]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_driven_probe_without_counters_times_out() {
        let config = short_config(CommunicationPattern::EventDriven);
        let sink = Arc::new(RecordingSink::default());

        let report = runner(config, sink.clone())
            .with_oracle(Arc::new(ScriptedOracle::default()))
            .run(Scenario::E2eProbe)
            .await
            .unwrap();

        // each correlation holds the single VU for the 2s timeout
        assert_eq!(report.dispatched(), 2);
        assert_eq!(sink.values(MetricName::E2eFailure), vec![1.0, 1.0]);
        assert!(sink.values(MetricName::E2eLatency).is_empty());
    }
}
