// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resident-memory sampling for worker processes.
//!
//! The host registers every spawned worker here; `live_metrics` refreshes
//! the resident set size of the registered pids on demand and silently
//! drops processes that have exited. Snapshots are built fresh per call
//! and never cached.

use fm_core::{MetricsSource, StatusHandle, WorkerId, WorkerKeyHash, WorkerProcessMetrics};
use parking_lot::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::debug;

/// A worker slot to track, as known at spawn time.
#[derive(Debug, Clone)]
pub struct WorkerRegistration {
    pub pid: u32,
    pub worker_id: WorkerId,
    pub worker_key_hash: WorkerKeyHash,
    pub mnemonic: String,
    pub status: StatusHandle,
}

/// One tracked OS process; multiplexed worker ids collapse into a single
/// entry keyed by pid.
struct ProcessEntry {
    pid: u32,
    worker_key_hash: WorkerKeyHash,
    mnemonic: String,
    worker_ids: Vec<WorkerId>,
    status: StatusHandle,
}

struct CollectorState {
    entries: Vec<ProcessEntry>,
    system: System,
}

/// `MetricsSource` backed by the OS process table.
pub struct ResidentMemoryCollector {
    state: Mutex<CollectorState>,
}

impl ResidentMemoryCollector {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CollectorState {
                entries: Vec::new(),
                system: System::new(),
            }),
        }
    }

    /// Track a worker. Registering another worker id against an
    /// already-known pid merges into the existing entry; the first
    /// registration's key hash, mnemonic, and status handle win.
    pub fn register(&self, registration: WorkerRegistration) {
        let mut state = self.state.lock();
        if let Some(entry) = state
            .entries
            .iter_mut()
            .find(|e| e.pid == registration.pid)
        {
            if !entry.worker_ids.contains(&registration.worker_id) {
                entry.worker_ids.push(registration.worker_id);
            }
            return;
        }
        state.entries.push(ProcessEntry {
            pid: registration.pid,
            worker_key_hash: registration.worker_key_hash,
            mnemonic: registration.mnemonic,
            worker_ids: vec![registration.worker_id],
            status: registration.status,
        });
    }

    /// Stop tracking a pid, e.g. after the host reaped the process.
    pub fn deregister_pid(&self, pid: u32) {
        let mut state = self.state.lock();
        state.entries.retain(|e| e.pid != pid);
    }

    /// Number of tracked processes (not worker ids).
    pub fn tracked_count(&self) -> usize {
        self.state.lock().entries.len()
    }
}

impl Default for ResidentMemoryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSource for ResidentMemoryCollector {
    fn live_metrics(&self) -> Vec<WorkerProcessMetrics> {
        let mut state = self.state.lock();
        let pids: Vec<Pid> = state
            .entries
            .iter()
            .map(|e| Pid::from_u32(e.pid))
            .collect();
        state
            .system
            .refresh_processes(ProcessesToUpdate::Some(&pids), true);

        let CollectorState { entries, system } = &mut *state;
        entries.retain(|entry| {
            let live = system.process(Pid::from_u32(entry.pid)).is_some();
            if !live {
                debug!(pid = entry.pid, mnemonic = %entry.mnemonic, "worker process gone, dropping from metrics");
            }
            live
        });

        entries
            .iter()
            .map(|entry| {
                let resident_bytes = system
                    .process(Pid::from_u32(entry.pid))
                    .map(|p| p.memory())
                    .unwrap_or(0);
                WorkerProcessMetrics {
                    pid: entry.pid,
                    worker_key_hash: entry.worker_key_hash.clone(),
                    mnemonic: entry.mnemonic.clone(),
                    worker_ids: entry.worker_ids.clone(),
                    used_memory_kb: resident_bytes / 1024,
                    status: entry.status.clone(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
