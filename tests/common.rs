// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides quiet logging, dataset fixtures, and test configuration builders
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `nutrition_enrichment`

use anyhow::Result;
use flate2::write::GzEncoder;
use flate2::Compression;
use nutrition_enrichment::config::{DatasetConfig, EnrichmentConfig, RefreshConfig};
use nutrition_enrichment::dataset::DatasetCodec;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

/// Columns of the product export, in export order
pub const HEADER: &str = "product_name,categories,brands,energy_100g,proteins_100g,carbohydrates_100g,fat_100g,fiber_100g,sugars_100g,nutriscore_grade,nova_group,ingredients_text,allergens_tags,additives_tags";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN, // Default to WARN for quiet tests
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// One product row with the given name and per-100 g energy (kJ) / protein
pub fn product_row(name: &str, energy_kj: f64, protein: f64) -> String {
    format!("\"{name}\",Meals,Acme,{energy_kj},{protein},20,5,2,3,b,3,\"water, salt\",en:milk,en:e330")
}

/// Dataset text: header followed by `rows`
pub fn dataset_text(rows: &[String]) -> String {
    let mut text = String::from(HEADER);
    text.push('\n');
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text
}

/// Write a dataset file into `dir` and return its path
pub fn write_dataset(dir: &Path, rows: &[String]) -> Result<PathBuf> {
    let path = dir.join("products.csv");
    std::fs::write(&path, dataset_text(rows))?;
    Ok(path)
}

/// Gzip-compressed bytes of `text`
pub fn gzip(text: &str) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(text.as_bytes())?;
    Ok(encoder.finish()?)
}

/// Dataset configuration over `path` with default weights
pub fn dataset_config(path: &Path) -> DatasetConfig {
    DatasetConfig {
        path: path.to_path_buf(),
        ..DatasetConfig::default()
    }
}

/// Refresh configuration pulling a gzip export from `url`
pub fn refresh_config(url: &str) -> RefreshConfig {
    RefreshConfig {
        source_url: url.to_owned(),
        codec: DatasetCodec::Gzip,
        download_timeout: Duration::from_secs(10),
        interval: Duration::from_secs(3600),
        schedule_enabled: false,
    }
}

/// Full configuration over a dataset at `path`, external search disabled
pub fn enrichment_config(path: &Path) -> EnrichmentConfig {
    EnrichmentConfig {
        dataset: dataset_config(path),
        ..EnrichmentConfig::default()
    }
}
