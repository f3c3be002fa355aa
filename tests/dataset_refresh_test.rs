// ABOUTME: Integration tests for the dataset refresh manager against a mock HTTP source
// ABOUTME: Covers install, failure preservation, mutual exclusion, progress, and status shape
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use common::{
    dataset_config, dataset_text, gzip, init_test_logging, product_row, refresh_config,
    write_dataset,
};
use nutrition_enrichment::dataset::{
    DatasetRefreshManager, RefreshOutcome, RefreshState, RefreshStatus, RejectReason,
};
use nutrition_enrichment::errors::ErrorCode;
use nutrition_enrichment::nutrition::dataset_search::DatasetSearchEngine;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EXPORT_PATH: &str = "/exports/products.csv.gz";

async fn serve(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(EXPORT_PATH))
        .respond_with(response)
        .mount(server)
        .await;
}

fn manager(dataset: &Path, server: &MockServer) -> Result<DatasetRefreshManager> {
    let url = format!("{}{EXPORT_PATH}", server.uri());
    Ok(DatasetRefreshManager::new(
        &dataset_config(dataset),
        refresh_config(&url),
    )?)
}

/// Follow status updates until the run completes or fails, collecting progress
async fn wait_for_outcome(
    rx: &mut watch::Receiver<RefreshStatus>,
    progress: &mut Vec<u8>,
) -> Result<RefreshStatus> {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            {
                let status = rx.borrow_and_update();
                progress.push(status.progress);
                if matches!(status.state, RefreshState::Completed | RefreshState::Error) {
                    return Ok(status.clone());
                }
            }
            rx.changed().await?;
        }
    })
    .await?
}

fn assert_no_temp_files(dataset: &Path) {
    for suffix in ["download", "partial"] {
        let mut name = dataset.file_name().unwrap().to_os_string();
        name.push(format!(".{suffix}"));
        assert!(
            !dataset.with_file_name(name).exists(),
            "temporary .{suffix} file left behind"
        );
    }
}

#[tokio::test]
async fn test_refresh_installs_new_dataset() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    let export = dataset_text(&[product_row("Quinoa salad", 600.0, 4.0)]);
    serve(&server, ResponseTemplate::new(200).set_body_bytes(gzip(&export)?)).await;

    let dir = tempfile::tempdir()?;
    let dataset = dir.path().join("data").join("products.csv");
    let manager = manager(&dataset, &server)?;
    assert_eq!(manager.status().state, RefreshState::Idle);
    assert_eq!(manager.status().last_update, None);

    manager.refresh_now().await?;

    let status = manager.status();
    assert_eq!(status.state, RefreshState::Completed);
    assert_eq!(status.progress, 100);
    assert!(status.last_update.is_some());
    assert_eq!(status.error, None);
    assert_eq!(std::fs::read_to_string(&dataset)?, export);
    assert_no_temp_files(&dataset);

    let engine = DatasetSearchEngine::new(dataset_config(&dataset));
    let found = engine.search(&["quinoa".to_owned()]).await.unwrap();
    assert_eq!(found.record.product_name, "Quinoa salad");
    Ok(())
}

#[tokio::test]
async fn test_failed_download_keeps_previous_dataset() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    serve(&server, ResponseTemplate::new(500)).await;

    let dir = tempfile::tempdir()?;
    let dataset = write_dataset(dir.path(), &[product_row("Old rice", 500.0, 2.0)])?;
    let before = std::fs::read(&dataset)?;
    let manager = manager(&dataset, &server)?;
    let bootstrapped = manager.status().last_update;
    assert!(bootstrapped.is_some());

    let err = manager.refresh_now().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ExternalServiceError);

    let status = manager.status();
    assert_eq!(status.state, RefreshState::Error);
    assert!(status.error.unwrap().contains("500"));
    assert_eq!(status.last_update, bootstrapped);
    assert_eq!(std::fs::read(&dataset)?, before);
    assert_no_temp_files(&dataset);
    Ok(())
}

#[tokio::test]
async fn test_corrupt_export_is_not_installed() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    serve(
        &server,
        ResponseTemplate::new(200).set_body_bytes(b"<html>maintenance</html>".to_vec()),
    )
    .await;

    let dir = tempfile::tempdir()?;
    let dataset = write_dataset(dir.path(), &[product_row("Old rice", 500.0, 2.0)])?;
    let before = std::fs::read(&dataset)?;
    let manager = manager(&dataset, &server)?;

    assert!(manager.refresh_now().await.is_err());
    assert_eq!(manager.status().state, RefreshState::Error);
    assert_eq!(std::fs::read(&dataset)?, before);
    assert_no_temp_files(&dataset);
    Ok(())
}

#[tokio::test]
async fn test_export_without_product_column_is_rejected() -> Result<()> {
    let server = MockServer::start().await;
    serve(
        &server,
        ResponseTemplate::new(200).set_body_bytes(gzip("code,name\n1,rice\n")?),
    )
    .await;

    let dir = tempfile::tempdir()?;
    let dataset = write_dataset(dir.path(), &[product_row("Old rice", 500.0, 2.0)])?;
    let before = std::fs::read(&dataset)?;
    let manager = manager(&dataset, &server)?;

    let err = manager.refresh_now().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::SerializationError);
    assert_eq!(std::fs::read(&dataset)?, before);
    Ok(())
}

#[tokio::test]
async fn test_second_request_is_rejected_while_running() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    let export = dataset_text(&[product_row("Oats", 1600.0, 13.0)]);
    serve(
        &server,
        ResponseTemplate::new(200)
            .set_body_bytes(gzip(&export)?)
            .set_delay(Duration::from_millis(500)),
    )
    .await;

    let dir = tempfile::tempdir()?;
    let dataset = dir.path().join("products.csv");
    let manager = Arc::new(manager(&dataset, &server)?);
    let mut rx = manager.subscribe();

    assert!(!manager.is_running());
    assert_eq!(manager.start_refresh(), RefreshOutcome::Accepted);
    assert!(manager.is_running());
    assert_eq!(
        manager.start_refresh(),
        RefreshOutcome::Rejected(RejectReason::AlreadyInProgress)
    );
    let locked = manager.refresh_now().await.unwrap_err();
    assert_eq!(locked.code, ErrorCode::ResourceLocked);
    assert!(manager.status_report().is_downloading);

    let mut progress = Vec::new();
    let status = wait_for_outcome(&mut rx, &mut progress).await?;
    assert_eq!(status.state, RefreshState::Completed);
    assert_eq!(std::fs::read_to_string(&dataset)?, export);
    Ok(())
}

#[tokio::test]
async fn test_progress_never_decreases_during_a_run() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    let rows: Vec<String> = (0..2000)
        .map(|i| product_row(&format!("Product {i}"), 100.0 + f64::from(i), 1.0))
        .collect();
    serve(
        &server,
        ResponseTemplate::new(200).set_body_bytes(gzip(&dataset_text(&rows))?),
    )
    .await;

    let dir = tempfile::tempdir()?;
    let manager = Arc::new(manager(&dir.path().join("products.csv"), &server)?);
    let mut rx = manager.subscribe();

    assert!(manager.start_refresh().is_accepted());
    let mut progress = Vec::new();
    let status = wait_for_outcome(&mut rx, &mut progress).await?;

    assert_eq!(status.state, RefreshState::Completed);
    assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]), "{progress:?}");
    assert_eq!(progress.last(), Some(&100));
    Ok(())
}

#[tokio::test]
async fn test_status_report_shape() -> Result<()> {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir()?;
    let manager = manager(&dir.path().join("products.csv"), &server)?;

    let json = serde_json::to_value(manager.status_report())?;
    assert_eq!(json["isDownloading"], false);
    assert_eq!(json["progress"], 0);
    assert_eq!(json["status"], "idle");
    assert!(json["lastUpdate"].is_null());
    assert!(json["error"].is_null());
    Ok(())
}

#[tokio::test]
async fn test_scheduler_triggers_refresh_and_shuts_down() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    let export = dataset_text(&[product_row("Lentils", 480.0, 9.0)]);
    serve(&server, ResponseTemplate::new(200).set_body_bytes(gzip(&export)?)).await;

    let dir = tempfile::tempdir()?;
    let dataset = dir.path().join("products.csv");
    let manager = Arc::new(manager(&dataset, &server)?);
    let mut rx = manager.subscribe();

    let scheduler = manager.spawn_scheduler(Duration::from_millis(50))?;
    let mut progress = Vec::new();
    let status = wait_for_outcome(&mut rx, &mut progress).await?;
    scheduler.shutdown().await;

    assert_eq!(status.state, RefreshState::Completed);
    assert_eq!(std::fs::read_to_string(&dataset)?, export);
    Ok(())
}

#[tokio::test]
async fn test_scheduler_rejects_zero_interval() -> Result<()> {
    let server = MockServer::start().await;
    serve(&server, ResponseTemplate::new(200).set_body_bytes(gzip("")?)).await;

    let dir = tempfile::tempdir()?;
    let manager = Arc::new(manager(&dir.path().join("products.csv"), &server)?);

    let err = manager.spawn_scheduler(Duration::ZERO).err().unwrap();
    assert_eq!(err.code, ErrorCode::ConfigInvalid);
    assert_eq!(manager.status().state, RefreshState::Idle);
    Ok(())
}
