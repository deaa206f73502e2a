use electrocars::config::LoggingConfig;
use electrocars::logging::{LogContext, get_logger_with_context, init_logging, parse_log_level};

#[test]
fn file_logging_init_is_idempotent() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let config = LoggingConfig {
        level: "debug".to_string(),
        file: tmp_dir.path().join("electrocars.log").display().to_string(),
        console_output: false,
        ..LoggingConfig::default()
    };
    assert!(init_logging(&config).is_ok());
    assert!(init_logging(&config).is_ok());
}

#[test]
fn level_names_are_case_insensitive() {
    assert_eq!(parse_log_level("warning").unwrap(), tracing::Level::WARN);
    assert!(parse_log_level("loud").is_err());
}

#[test]
fn context_logger_keeps_component() {
    let logger = get_logger_with_context(LogContext::new("fleet").with_car_id("17"));
    assert_eq!(logger.component(), "fleet");
    logger.info("context logger smoke test");
}
