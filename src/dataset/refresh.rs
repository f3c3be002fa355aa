// ABOUTME: Background dataset refresh: streaming download, decode, and atomic install
// ABOUTME: Single-writer status channel, mutual exclusion of runs, and a periodic scheduler
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Dataset Refresh Manager
//!
//! A run goes `downloading -> decompressing -> completed`, or ends in `error`
//! from either active phase. Files involved, all next to the live dataset:
//!
//! - `<dataset>.download`: the compressed export as it streams in
//! - `<dataset>.partial`: the decoded staging copy
//!
//! The staging file is renamed over the live dataset only after it decoded
//! fully and its header has a `product_name` column. Any failure removes
//! both temporary files and leaves the live dataset as it was. Failed runs
//! are not retried; the next scheduler tick or explicit request is the retry.
//!
//! Only one run is active at a time. [`DatasetRefreshManager::start_refresh`]
//! rejects a second request immediately instead of queueing it.
//!
//! Status lives in a [`tokio::sync::watch`] channel written only by the run
//! holding the in-progress flag. Readers take snapshots with
//! [`DatasetRefreshManager::status`] or follow transitions with
//! [`DatasetRefreshManager::subscribe`].

use crate::config::{DatasetConfig, RefreshConfig};
use crate::constants::refresh::{
    DOWNLOAD_SUFFIX, PROGRESS_DECOMPRESS, PROGRESS_DOWNLOAD_END, PROGRESS_DOWNLOAD_START,
    STAGING_SUFFIX,
};
use crate::dataset::status::{RefreshState, RefreshStatus, StatusReport};
use crate::errors::{AppError, AppResult};
use crate::nutrition::dataset_search::DatasetRows;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Why a refresh request was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Another run holds the in-progress flag
    AlreadyInProgress,
}

/// Answer to [`DatasetRefreshManager::start_refresh`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A run was started in the background
    Accepted,
    /// No run was started
    Rejected(RejectReason),
}

impl RefreshOutcome {
    /// Whether a run was started
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Clears the in-progress flag when the run ends, however it ends
struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Owns the refresh pipeline and its status
pub struct DatasetRefreshManager {
    dataset_path: PathBuf,
    delimiter: u8,
    refresh: RefreshConfig,
    http_client: reqwest::Client,
    status_tx: watch::Sender<RefreshStatus>,
    in_progress: Arc<AtomicBool>,
}

impl DatasetRefreshManager {
    /// Create a manager for the dataset at `dataset.path`
    ///
    /// When the dataset already exists, its modification time seeds
    /// `last_update`.
    ///
    /// # Errors
    ///
    /// Returns a config error if the HTTP client cannot be built
    pub fn new(dataset: &DatasetConfig, refresh: RefreshConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(refresh.download_timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build download client: {e}")))?;

        let last_update = std::fs::metadata(&dataset.path)
            .and_then(|meta| meta.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        let (status_tx, _) = watch::channel(RefreshStatus::idle(last_update));

        Ok(Self {
            dataset_path: dataset.path.clone(),
            delimiter: dataset.delimiter,
            refresh,
            http_client,
            status_tx,
            in_progress: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Snapshot of the current status
    #[must_use]
    pub fn status(&self) -> RefreshStatus {
        self.status_tx.borrow().clone()
    }

    /// Status in the status-query shape
    #[must_use]
    pub fn status_report(&self) -> StatusReport {
        self.status_tx.borrow().report()
    }

    /// Receiver that observes every status transition
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RefreshStatus> {
        self.status_tx.subscribe()
    }

    /// Whether a run currently holds the in-progress flag
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    fn publish(&self, update: impl FnOnce(&mut RefreshStatus)) {
        self.status_tx.send_modify(update);
    }

    /// Take the in-progress flag and mark the run as downloading
    fn try_begin(&self) -> Option<RunGuard> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.publish(|status| status.begin(PROGRESS_DOWNLOAD_START));
        Some(RunGuard {
            flag: Arc::clone(&self.in_progress),
        })
    }

    /// Start a run in the background, or reject if one is active
    pub fn start_refresh(self: &Arc<Self>) -> RefreshOutcome {
        let Some(guard) = self.try_begin() else {
            info!("Dataset refresh already in progress, request rejected");
            return RefreshOutcome::Rejected(RejectReason::AlreadyInProgress);
        };

        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = guard;
            // Outcome is already recorded in the status channel
            let _ = manager.run().await;
        });
        RefreshOutcome::Accepted
    }

    /// Run a refresh to completion on the current task
    ///
    /// # Errors
    ///
    /// Returns `ResourceLocked` if a run is already active, otherwise the
    /// error that ended the run (also recorded in the status)
    pub async fn refresh_now(&self) -> AppResult<()> {
        let _guard = self
            .try_begin()
            .ok_or_else(|| AppError::resource_locked("Dataset refresh already in progress"))?;
        self.run().await
    }

    async fn run(&self) -> AppResult<()> {
        let download_path = sibling(&self.dataset_path, DOWNLOAD_SUFFIX);
        let staging_path = sibling(&self.dataset_path, STAGING_SUFFIX);
        info!(
            url = %self.refresh.source_url,
            codec = %self.refresh.codec,
            dataset = %self.dataset_path.display(),
            "Dataset refresh started"
        );

        match self.download_and_install(&download_path, &staging_path).await {
            Ok(()) => {
                remove_if_present(&download_path).await;
                self.publish(|status| status.complete(Utc::now()));
                info!(dataset = %self.dataset_path.display(), "Dataset refresh completed");
                Ok(())
            }
            Err(e) => {
                remove_if_present(&download_path).await;
                remove_if_present(&staging_path).await;
                let message = e.to_string();
                self.publish(|status| status.fail(message));
                error!("Dataset refresh failed: {}", e);
                Err(e)
            }
        }
    }

    async fn download_and_install(
        &self,
        download_path: &Path,
        staging_path: &Path,
    ) -> AppResult<()> {
        let parent = self
            .dataset_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());
        if let Some(parent) = parent {
            tokio::fs::create_dir_all(parent).await?;
        }

        self.download(download_path).await?;

        self.publish(|status| status.advance(RefreshState::Decompressing, PROGRESS_DECOMPRESS));
        let codec = self.refresh.codec;
        let delimiter = self.delimiter;
        let (src, dst) = (download_path.to_path_buf(), staging_path.to_path_buf());
        let decoded = tokio::task::spawn_blocking(move || -> AppResult<u64> {
            let written = codec.decompress(&src, &dst)?;
            verify_header(&dst, delimiter)?;
            Ok(written)
        })
        .await
        .map_err(|e| AppError::internal(format!("Decompression task failed: {e}")))??;
        debug!(bytes = decoded, "Dataset decoded");

        tokio::fs::rename(staging_path, &self.dataset_path).await?;
        Ok(())
    }

    async fn download(&self, dest: &Path) -> AppResult<()> {
        let response = self
            .http_client
            .get(&self.refresh.source_url)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(
                "dataset source",
                format!("HTTP {status} from {}", self.refresh.source_url),
            ));
        }

        let total = response.content_length().filter(|len| *len > 0);
        let mut file = BufWriter::new(tokio::fs::File::create(dest).await?);
        let mut stream = response.bytes_stream();
        let mut received: u64 = 0;
        let mut reported = PROGRESS_DOWNLOAD_START;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            received += chunk.len() as u64;

            if let Some(total) = total {
                let progress = download_progress(received, total);
                if progress > reported {
                    reported = progress;
                    self.publish(|status| status.advance(RefreshState::Downloading, progress));
                }
            }
        }
        file.flush().await?;

        info!(bytes = received, "Dataset download finished");
        Ok(())
    }

    /// Start a background task that requests a refresh every `interval`
    ///
    /// The first request fires one interval after start. Ticks that find a
    /// run in progress are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` for a zero interval
    pub fn spawn_scheduler(self: &Arc<Self>, interval: Duration) -> AppResult<SchedulerHandle> {
        if interval.is_zero() {
            return Err(AppError::config_invalid(
                "refresh interval must be greater than zero",
            ));
        }
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let manager = Arc::clone(self);

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match manager.start_refresh() {
                            RefreshOutcome::Accepted => info!("Scheduled dataset refresh started"),
                            RefreshOutcome::Rejected(reason) => {
                                debug!(?reason, "Scheduled dataset refresh skipped");
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Dataset refresh scheduler shutting down");
                        break;
                    }
                }
            }
        });

        info!(interval_secs = interval.as_secs(), "Dataset refresh scheduler started");
        Ok(SchedulerHandle { shutdown_tx, task })
    }
}

/// Handle to a running scheduler
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop scheduling; a run already started keeps going
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            warn!("Dataset refresh scheduler ended abnormally: {}", e);
        }
    }
}

/// Progress for `received` of `total` bytes, ramping start..end
fn download_progress(received: u64, total: u64) -> u8 {
    let span = u64::from(PROGRESS_DOWNLOAD_END - PROGRESS_DOWNLOAD_START);
    let step = (span * received.min(total)) / total.max(1);
    // step <= span, which fits in u8
    PROGRESS_DOWNLOAD_START + u8::try_from(step).unwrap_or(0)
}

/// `<path>.<suffix>` in the same directory as `path`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// Reject decoded files that are not a product export
fn verify_header(path: &Path, delimiter: u8) -> AppResult<()> {
    let rows = DatasetRows::open(path, delimiter)?;
    if rows.columns().position("product_name").is_none() {
        return Err(AppError::serialization(
            "Downloaded dataset has no product_name column",
        ));
    }
    Ok(())
}

async fn remove_if_present(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed temporary dataset file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "Failed to remove temporary file: {}", e),
    }
}
