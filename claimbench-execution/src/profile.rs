//! Arrival-rate profiles

use crate::error::{SchedulerError, SchedulerResult};
use claimbench_config::{ArrivalRateConfig, RampConfig, RampMode};
use claimbench_core::LoadStage;
use std::time::Duration;

/// Target arrival rate over time: an ordered sequence of stages traversed
/// strictly in order.
///
/// A constant arrival rate is a profile with one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct RateProfile {
    start_rate: f64,
    time_unit: Duration,
    stages: Vec<LoadStage>,
    mode: RampMode,
}

impl RateProfile {
    pub fn constant(rate: f64, time_unit: Duration, duration: Duration) -> SchedulerResult<Self> {
        let stage = LoadStage::new(rate, duration)?;
        Self::ramping(rate, time_unit, vec![stage], RampMode::Step)
    }

    pub fn ramping(
        start_rate: f64,
        time_unit: Duration,
        stages: Vec<LoadStage>,
        mode: RampMode,
    ) -> SchedulerResult<Self> {
        if stages.is_empty() {
            return Err(SchedulerError::Configuration(
                "a rate profile needs at least one stage".to_string(),
            ));
        }
        if time_unit.is_zero() {
            return Err(SchedulerError::Configuration(
                "time unit must be greater than 0".to_string(),
            ));
        }
        if !(start_rate.is_finite() && start_rate >= 0.0) {
            return Err(SchedulerError::Configuration(format!(
                "start rate must be a non-negative number, got {}",
                start_rate
            )));
        }

        Ok(Self {
            start_rate,
            time_unit,
            stages,
            mode,
        })
    }

    pub fn from_arrival_config(config: &ArrivalRateConfig) -> SchedulerResult<Self> {
        Self::constant(config.rate, config.time_unit, config.duration)
    }

    pub fn from_ramp_config(config: &RampConfig) -> SchedulerResult<Self> {
        Self::ramping(
            config.start_rate,
            config.time_unit,
            config.load_stages()?,
            config.mode,
        )
    }

    pub fn stages(&self) -> &[LoadStage] {
        &self.stages
    }

    pub fn mode(&self) -> RampMode {
        self.mode
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    /// Active target rate, per time unit, `elapsed` into the profile.
    /// `None` once every stage has run.
    pub fn rate_at(&self, elapsed: Duration) -> Option<f64> {
        let mut stage_start = Duration::ZERO;
        let mut previous_target = self.start_rate;

        for stage in &self.stages {
            let stage_end = stage_start + stage.duration;
            if elapsed < stage_end {
                let rate = match self.mode {
                    RampMode::Step => stage.target,
                    RampMode::Linear => {
                        let progress = (elapsed - stage_start).as_secs_f64() / stage.duration.as_secs_f64();
                        previous_target + (stage.target - previous_target) * progress
                    }
                };
                return Some(rate);
            }
            previous_target = stage.target;
            stage_start = stage_end;
        }

        None
    }

    /// Active target rate in iterations per second
    pub fn per_second_at(&self, elapsed: Duration) -> Option<f64> {
        self.rate_at(elapsed)
            .map(|rate| rate / self.time_unit.as_secs_f64())
    }

    /// Offset of the arrival that follows one at `previous`, or `None` when
    /// it would fall past the end of the profile.
    ///
    /// The next arrival is where the integral of the rate from `previous`
    /// reaches one iteration, so stage boundaries and linear ramps are
    /// honoured exactly.
    pub fn next_arrival(&self, previous: Duration) -> Option<Duration> {
        let unit = self.time_unit.as_secs_f64();
        let from = previous.as_secs_f64();
        let mut remaining = 1.0;
        let mut stage_start = 0.0;
        let mut previous_target = self.start_rate;

        for stage in &self.stages {
            let length = stage.duration.as_secs_f64();
            let stage_end = stage_start + length;

            if from < stage_end {
                let segment_start = from.max(stage_start);
                let segment = stage_end - segment_start;
                let rate_start = match self.mode {
                    RampMode::Step => stage.target,
                    RampMode::Linear => {
                        previous_target
                            + (stage.target - previous_target) * (segment_start - stage_start) / length
                    }
                } / unit;
                let rate_end = match self.mode {
                    RampMode::Step => rate_start,
                    RampMode::Linear => stage.target / unit,
                };

                let area = (rate_start + rate_end) / 2.0 * segment;
                if area >= remaining {
                    let slope = (rate_end - rate_start) / segment;
                    let offset = if slope.abs() < f64::EPSILON {
                        remaining / rate_start
                    } else {
                        (-rate_start + (rate_start * rate_start + 2.0 * slope * remaining).sqrt()) / slope
                    };
                    let next = to_duration(segment_start + offset);
                    return (next < self.total_duration()).then_some(next);
                }
                remaining -= area;
            }

            previous_target = stage.target;
            stage_start = stage_end;
        }

        None
    }
}

/// Seconds to a duration, rounded to the microsecond so accumulated float
/// error cannot shift an arrival across a boundary
fn to_duration(secs: f64) -> Duration {
    Duration::from_micros((secs * 1_000_000.0).round() as u64)
}
