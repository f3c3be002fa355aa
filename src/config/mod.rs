// ABOUTME: Configuration management module for the nutrition enrichment core
// ABOUTME: Loads dataset, refresh, external search, and matching settings from the environment
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Configuration module
//!
//! - **Environment**: every tunable loaded from environment variables with defaults
//! - **Global**: a process-wide, load-once instance for binaries

/// Environment-driven configuration types
pub mod environment;

pub use environment::{
    DatasetConfig, EnrichmentConfig, EnrichmentLimits, ExternalSearchConfig, MatchWeights,
    RefreshConfig,
};
