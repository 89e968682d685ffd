use claimbench_config::{LogFormat, LogLevel, LoggingConfig};
use claimbench_logging::{build_env_filter, init_logging_from_config, init_simple_tracing};

#[test]
fn test_logging_config_from_yaml() {
    let config: LoggingConfig = serde_yaml::from_str("level: debug\nformat: json\n").unwrap();
    assert_eq!(config.level, LogLevel::Debug);
    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.transport_level, LogLevel::Warn);
    assert!(!config.include_location);
}

#[test]
fn test_filter_quiets_transport_crates() {
    let config: LoggingConfig = serde_yaml::from_str("level: debug\ntransport_level: info\n").unwrap();
    let filter = build_env_filter(&config.directives()).to_string();
    assert!(filter.contains("debug"));
    assert!(filter.contains("hyper=info"));
    assert!(filter.contains("tonic=info"));
}

#[test]
fn test_repeated_initialisation_is_not_an_error() {
    let config = LoggingConfig {
        format: LogFormat::Compact,
        ..LoggingConfig::default()
    };
    assert!(init_logging_from_config(&config).is_ok());
    assert!(init_logging_from_config(&config).is_ok());
    assert!(init_simple_tracing("trace").is_ok());
    tracing::info!("still logging after re-initialisation");
}
