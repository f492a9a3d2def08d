// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sweep policies the lifecycle manager runs against the pool.

use fm_core::{WorkerId, WorkerProcessMetrics, WorkerStatus};
use fm_pool::{SweepPolicy, Verdict, Worker};
use std::collections::BTreeSet;
use tracing::info;

/// Inspect-only pass: records the ids of every idle worker, destroys
/// nothing. Gives the manager the same idle/busy view the pool itself
/// uses.
#[derive(Debug, Default)]
pub struct IdleInspector {
    worker_ids: BTreeSet<WorkerId>,
}

impl IdleInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_worker_ids(self) -> BTreeSet<WorkerId> {
        self.worker_ids
    }
}

impl SweepPolicy for IdleInspector {
    fn visit(&mut self, worker: &Worker, _idle_count: usize) -> Verdict {
        self.worker_ids.insert(worker.id());
        Verdict::Keep
    }
}

/// Destructive pass: destroys the idle workers whose ids were selected as
/// eviction candidates and reports which ones it actually reached.
///
/// A candidate that was checked out between inspection and this sweep is
/// simply not visited and escapes destruction.
#[derive(Debug)]
pub struct CandidateEviction {
    to_evict: BTreeSet<WorkerId>,
    evicted: BTreeSet<WorkerId>,
}

impl CandidateEviction {
    /// Flattens the candidates' logical worker-id sets into the evict set.
    pub fn new(candidates: &[WorkerProcessMetrics]) -> Self {
        Self {
            to_evict: candidates
                .iter()
                .flat_map(|m| m.worker_ids.iter().copied())
                .collect(),
            evicted: BTreeSet::new(),
        }
    }

    /// Ids for which destruction was signalled.
    pub fn into_evicted(self) -> BTreeSet<WorkerId> {
        self.evicted
    }
}

impl SweepPolicy for CandidateEviction {
    fn visit(&mut self, worker: &Worker, _idle_count: usize) -> Verdict {
        if !self.to_evict.contains(&worker.id()) {
            return Verdict::Keep;
        }
        // Destruction through a sweep bypasses the check-in path, so the
        // deferred-kill tag has to be set here.
        worker
            .status()
            .maybe_update(WorkerStatus::PendingKillDueToMemoryPressure);
        self.evicted.insert(worker.id());
        info!(
            worker_id = %worker.id(),
            mnemonic = worker.key().mnemonic(),
            "evicting idle worker"
        );
        Verdict::Destroy
    }
}

#[cfg(test)]
#[path = "sweep_tests.rs"]
mod tests;
