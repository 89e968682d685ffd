//! Parsing helpers shared by the configuration domains and the loader

use crate::error::{ConfigError, ConfigResult};
use crate::domains::load::StageConfig;
use std::time::Duration;

/// Default functions for serde
pub fn default_true() -> bool {
    true
}

pub fn default_false() -> bool {
    false
}

/// Split a comma-separated list, trimming entries and dropping empty ones
pub fn parse_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a human readable duration such as `30s`, `5m` or `500ms`
pub fn parse_duration(value: &str) -> ConfigResult<Duration> {
    humantime::parse_duration(value.trim())
        .map_err(|e| ConfigError::ValidationError(format!("Invalid duration '{}': {}", value, e)))
}

/// Parse a boolean flag; `1`, `true`, `yes` and `on` enable it
pub fn parse_flag(value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::ValidationError(format!(
            "Invalid boolean flag '{}'",
            other
        ))),
    }
}

/// Parse a stage list of `target:duration` pairs, e.g. `20:5m,40:5m`.
///
/// Every pair must be well formed with a positive target and a non-zero
/// duration; nothing is skipped.
pub fn parse_stages(value: &str) -> ConfigResult<Vec<StageConfig>> {
    let stages = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_stage)
        .collect::<ConfigResult<Vec<_>>>()?;

    if stages.is_empty() {
        return Err(ConfigError::StageError {
            spec: value.to_string(),
            message: "at least one stage is required".to_string(),
        });
    }
    Ok(stages)
}

fn parse_stage(pair: &str) -> ConfigResult<StageConfig> {
    let stage_error = |message: String| ConfigError::StageError {
        spec: pair.to_string(),
        message,
    };

    let (target, duration) = pair
        .split_once(':')
        .ok_or_else(|| stage_error("expected target:duration".to_string()))?;

    let target: f64 = target
        .trim()
        .parse()
        .map_err(|e| stage_error(format!("invalid target: {}", e)))?;
    if !target.is_finite() || target <= 0.0 {
        return Err(stage_error("target must be greater than 0".to_string()));
    }

    let duration = humantime::parse_duration(duration.trim())
        .map_err(|e| stage_error(format!("invalid duration: {}", e)))?;
    if duration.is_zero() {
        return Err(stage_error("duration must be non-zero".to_string()));
    }

    Ok(StageConfig { target, duration })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv() {
        assert_eq!(parse_csv(" a, b ,,c,"), vec!["a", "b", "c"]);
        assert!(parse_csv(" , ").is_empty());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1").unwrap());
        assert!(parse_flag("TRUE").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(!parse_flag("").unwrap());
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn test_parse_stages() {
        let stages = parse_stages("20:5m, 40:5m,60:30s").unwrap();
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0].target, 20.0);
        assert_eq!(stages[1].duration, Duration::from_secs(300));
        assert_eq!(stages[2].duration, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_stages_rejects_malformed_pairs() {
        assert!(parse_stages("20:5m,40").is_err());
        assert!(parse_stages("abc:5m").is_err());
        assert!(parse_stages("0:5m").is_err());
        assert!(parse_stages("-5:5m").is_err());
        assert!(parse_stages("20:0s").is_err());
        assert!(parse_stages("20:forever").is_err());
        assert!(parse_stages("").is_err());
    }
}
