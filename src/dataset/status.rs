// ABOUTME: Refresh state machine snapshot and its camelCase status-query representation
// ABOUTME: Keeps progress monotonic within a run and records the last successful install
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::constants::refresh::PROGRESS_COMPLETE;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the refresh pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshState {
    /// No refresh has run since start-up
    #[default]
    Idle,
    /// Streaming the compressed export to disk
    Downloading,
    /// Decoding the export into the staging file
    Decompressing,
    /// Last run installed a new dataset
    Completed,
    /// Last run failed; the previous dataset is still live
    Error,
}

impl RefreshState {
    /// Whether a run is in flight
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Downloading | Self::Decompressing)
    }
}

impl fmt::Display for RefreshState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Downloading => "downloading",
            Self::Decompressing => "decompressing",
            Self::Completed => "completed",
            Self::Error => "error",
        })
    }
}

/// Current refresh status
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RefreshStatus {
    /// Pipeline phase
    pub state: RefreshState,
    /// Percent complete (0-100), non-decreasing within one run
    pub progress: u8,
    /// When a dataset was last installed successfully
    pub last_update: Option<DateTime<Utc>>,
    /// Message of the most recent failure
    pub error: Option<String>,
}

impl RefreshStatus {
    /// Status at start-up, carrying a previously installed dataset's timestamp
    #[must_use]
    pub const fn idle(last_update: Option<DateTime<Utc>>) -> Self {
        Self {
            state: RefreshState::Idle,
            progress: 0,
            last_update,
            error: None,
        }
    }

    /// Enter the first active phase of a new run
    pub fn begin(&mut self, progress: u8) {
        self.state = RefreshState::Downloading;
        self.progress = progress.min(100);
        self.error = None;
    }

    /// Move to `state` with at least `progress`; progress never goes back
    pub fn advance(&mut self, state: RefreshState, progress: u8) {
        self.state = state;
        self.progress = self.progress.max(progress.min(100));
    }

    /// Finish a run successfully
    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.state = RefreshState::Completed;
        self.progress = PROGRESS_COMPLETE;
        self.last_update = Some(at);
        self.error = None;
    }

    /// Finish a run with an error; progress and `last_update` are kept
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = RefreshState::Error;
        self.error = Some(message.into());
    }

    /// Status-query view
    #[must_use]
    pub fn report(&self) -> StatusReport {
        StatusReport::from(self)
    }
}

/// Status-query payload
///
/// Serializes as `{isDownloading, progress, status, lastUpdate, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// A run is in flight
    pub is_downloading: bool,
    /// Percent complete
    pub progress: u8,
    /// Pipeline phase
    pub status: RefreshState,
    /// Last successful install
    pub last_update: Option<DateTime<Utc>>,
    /// Most recent failure
    pub error: Option<String>,
}

impl From<&RefreshStatus> for StatusReport {
    fn from(status: &RefreshStatus) -> Self {
        Self {
            is_downloading: status.state.is_active(),
            progress: status.progress,
            status: status.state,
            last_update: status.last_update,
            error: status.error.clone(),
        }
    }
}
