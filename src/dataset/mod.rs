// ABOUTME: Dataset lifecycle: compressed export codecs, refresh pipeline, and refresh status
// ABOUTME: The live dataset file is only ever replaced by the refresh manager
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// Export compression codecs
pub mod codec;
/// Download, decode, and install pipeline
pub mod refresh;
/// Refresh state and status-query payload
pub mod status;

pub use codec::DatasetCodec;
pub use refresh::{DatasetRefreshManager, RefreshOutcome, RejectReason, SchedulerHandle};
pub use status::{RefreshState, RefreshStatus, StatusReport};
