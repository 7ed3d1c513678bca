//! Tests for the logging system

use super::*;

#[test]
fn test_log_level_display() {
    assert_eq!(LogLevel::Trace.to_string(), "trace");
    assert_eq!(LogLevel::Debug.to_string(), "debug");
    assert_eq!(LogLevel::Info.to_string(), "info");
    assert_eq!(LogLevel::Warn.to_string(), "warn");
    assert_eq!(LogLevel::Error.to_string(), "error");
}

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert_eq!(config.level, LogLevel::Info);
    assert_eq!(config.format, LogFormat::Text);
    assert_eq!(config.output, LogOutput::Console);
    assert_eq!(config.rotation, LogRotation::Daily);
    assert!(config.log_directory.is_none());
    assert!(config.include_target);
}

#[test]
fn test_logging_config_builder() {
    let config = LoggingConfig::new()
        .with_level(LogLevel::Debug)
        .with_format(LogFormat::Json)
        .with_output(LogOutput::File)
        .with_target(false)
        .with_module_level("rag_gateway::ingestion", LogLevel::Trace);

    assert_eq!(config.level, LogLevel::Debug);
    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.output, LogOutput::File);
    assert!(!config.include_target);
    assert_eq!(
        config.module_levels.get("rag_gateway::ingestion"),
        Some(&LogLevel::Trace)
    );
}

#[test]
fn test_logging_config_presets() {
    let dev = LoggingConfig::development();
    assert_eq!(dev.level, LogLevel::Debug);
    assert_eq!(dev.output, LogOutput::Console);
    assert!(dev.include_file_info);

    let prod = LoggingConfig::production();
    assert_eq!(prod.format, LogFormat::Json);
    assert_eq!(prod.output, LogOutput::Both);
    assert!(prod.log_directory.is_some());
}

#[test]
fn test_logging_config_partial_deserialize() {
    let config: LoggingConfig =
        serde_json::from_str(r#"{"level": "warn", "format": "json"}"#).unwrap();
    assert_eq!(config.level, LogLevel::Warn);
    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.file_prefix, "rag-gateway.log");
}

#[test]
fn test_env_filter_includes_module_levels() {
    let config = LoggingConfig::new()
        .with_level(LogLevel::Warn)
        .with_module_level("rag_gateway::query", LogLevel::Debug);

    let filter = build_env_filter(&config).to_string();
    assert!(filter.contains("warn"));
    assert!(filter.contains("rag_gateway::query=debug"));
}
