// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observer events published by the lifecycle manager.

use crate::worker::{WorkerId, WorkerKeyHash};
use serde::{Deserialize, Serialize};

/// Events posted for machine consumers.
///
/// Serializes with `{"type": "event:name", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A logical worker was removed because of memory pressure, either
    /// through the pool's destruction path or by killing its process.
    /// Posted once per logical worker id, not per process.
    #[serde(rename = "worker:evicted")]
    WorkerEvicted {
        worker_id: WorkerId,
        worker_key_hash: WorkerKeyHash,
        mnemonic: String,
    },
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
