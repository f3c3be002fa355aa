// ABOUTME: Unit tests for logging functionality
// ABOUTME: Validates logging configuration defaults and environment variable handling
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use nutrition_enrichment::logging::{LogFormat, LoggingConfig};
use serial_test::serial;
use std::env;

fn clear_logging_env() {
    for var in [
        "RUST_LOG",
        "LOG_FORMAT",
        "ENVIRONMENT",
        "SERVICE_NAME",
        "LOG_INCLUDE_LOCATION",
        "LOG_INCLUDE_THREAD",
    ] {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_logging_config_from_env() {
    clear_logging_env();
    env::set_var("RUST_LOG", "debug");
    env::set_var("LOG_FORMAT", "json");
    env::set_var("ENVIRONMENT", "production");
    env::set_var("SERVICE_NAME", "test-service");

    let config = LoggingConfig::from_env();
    clear_logging_env();

    assert_eq!(config.level, "debug");
    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.environment, "production");
    assert_eq!(config.service_name, "test-service");
    // Production always carries location and thread ids
    assert!(config.include_location);
    assert!(config.include_thread);
}

#[test]
#[serial]
fn test_default_logging_config() {
    clear_logging_env();
    let config = LoggingConfig::from_env();

    assert_eq!(config.level, "info");
    assert_eq!(config.format, LogFormat::Pretty);
    assert_eq!(config.service_name, "nutrition-enrichment");
    assert!(!config.include_location);
    assert_eq!(config.service_version, env!("CARGO_PKG_VERSION"));
}

#[test]
#[serial]
fn test_compact_format_and_explicit_location() {
    clear_logging_env();
    env::set_var("LOG_FORMAT", "compact");
    env::set_var("LOG_INCLUDE_LOCATION", "1");

    let config = LoggingConfig::from_env();
    clear_logging_env();

    assert_eq!(config.format, LogFormat::Compact);
    assert!(config.include_location);
    assert!(!config.include_thread);
}
