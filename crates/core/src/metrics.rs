// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-process worker memory metrics.
//!
//! Snapshots are sampled fresh on every lifecycle tick and never retained
//! across ticks; only the `StatusHandle` inside a snapshot is shared state.

use crate::status::StatusHandle;
use crate::worker::{WorkerId, WorkerKeyHash};
use serde::{Deserialize, Serialize};

/// Memory metrics for one worker OS process.
///
/// One process may serve several logical worker ids (multiplex workers),
/// which is why `worker_ids` is a set rather than a single id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerProcessMetrics {
    /// OS process id.
    pub pid: u32,
    /// Stable identity of the worker's class/configuration.
    pub worker_key_hash: WorkerKeyHash,
    /// Human-readable worker class tag, e.g. "Javac".
    pub mnemonic: String,
    /// Logical worker ids currently bound to this process.
    pub worker_ids: Vec<WorkerId>,
    /// Resident set size in KiB at sampling time.
    pub used_memory_kb: u64,
    /// Shared status handle, mutated by both the lifecycle manager and the
    /// pool. Not part of the serialized snapshot.
    #[serde(skip)]
    pub status: StatusHandle,
}

impl WorkerProcessMetrics {
    /// Resident memory in whole megabytes.
    ///
    /// Truncating division by 1000, not 1024. The 1001..=1999 KiB window
    /// rounds down to 1 MB; downstream accounting depends on exactly this
    /// conversion, so keep it.
    pub fn used_memory_mb(&self) -> u64 {
        self.used_memory_kb / 1000
    }
}

/// Aggregate usage in MB: per-worker truncation first, then the sum.
pub fn total_memory_mb(metrics: &[WorkerProcessMetrics]) -> u64 {
    metrics.iter().map(|m| m.used_memory_mb()).sum()
}

/// Source of fresh worker process metrics.
///
/// Implementations must reflect currently-live processes and be safe to
/// call from the lifecycle thread while workers are spawned and reaped
/// elsewhere.
pub trait MetricsSource: Send + Sync {
    fn live_metrics(&self) -> Vec<WorkerProcessMetrics>;
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
