// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The keyed worker pool.
//!
//! One lock guards all sub-pools. Sweeps run entirely inside that lock, so
//! a worker cannot be checked out mid-sweep and every sweep sees a
//! consistent idle/busy view.

use crate::key::WorkerKey;
use crate::sweep::{SweepPolicy, Verdict};
use crate::worker::Worker;
use fm_core::WorkerId;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

/// Default maximum number of idle workers parked per key.
const DEFAULT_CAPACITY: usize = 4;

/// Errors from pool operations.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("worker {0} is already parked in the pool")]
    AlreadyIdle(WorkerId),
}

/// What happened to a worker on check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckinOutcome {
    /// Parked in its sub-pool for reuse.
    Parked,
    /// Removed through the destruction path: the worker was tagged for a
    /// deferred kill, or its sub-pool was already at idle capacity.
    Destroyed,
}

struct SubPool {
    capacity: usize,
    idle: Vec<Worker>,
    checked_out: HashSet<WorkerId>,
}

impl SubPool {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            idle: Vec::new(),
            checked_out: HashSet::new(),
        }
    }
}

struct PoolState {
    subpools: IndexMap<WorkerKey, SubPool>,
    default_capacity: usize,
}

/// Keyed pool of persistent workers.
pub struct WorkerPool {
    state: Mutex<PoolState>,
}

impl WorkerPool {
    pub fn new() -> Self {
        Self::with_default_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_default_capacity(default_capacity: usize) -> Self {
        Self {
            state: Mutex::new(PoolState {
                subpools: IndexMap::new(),
                default_capacity,
            }),
        }
    }

    /// Set the idle capacity for one key's sub-pool.
    pub fn set_capacity(&self, key: &WorkerKey, capacity: usize) {
        let mut state = self.state.lock();
        let default_capacity = state.default_capacity;
        state
            .subpools
            .entry(key.clone())
            .or_insert_with(|| SubPool::new(default_capacity))
            .capacity = capacity;
    }

    /// Borrow an idle worker for the given key.
    ///
    /// Workers tagged for a deferred kill while parked are destroyed here
    /// instead of being loaned out.
    pub fn checkout(&self, key: &WorkerKey) -> Option<Worker> {
        let mut state = self.state.lock();
        let subpool = state.subpools.get_mut(key)?;
        while let Some(worker) = subpool.idle.pop() {
            if worker.status().is_doomed() {
                debug!(worker_id = %worker.id(), mnemonic = key.mnemonic(), "destroying doomed worker on checkout");
                continue;
            }
            subpool.checked_out.insert(worker.id());
            return Some(worker);
        }
        None
    }

    /// Return a worker to the pool.
    ///
    /// A worker whose status reached pending-kill while it was checked out
    /// is destroyed instead of parked; the same happens when the sub-pool
    /// is already holding its capacity of idle workers.
    pub fn checkin(&self, worker: Worker) -> Result<CheckinOutcome, PoolError> {
        let mut state = self.state.lock();
        let default_capacity = state.default_capacity;
        let subpool = state
            .subpools
            .entry(worker.key().clone())
            .or_insert_with(|| SubPool::new(default_capacity));

        subpool.checked_out.remove(&worker.id());

        if subpool.idle.iter().any(|w| w.id() == worker.id()) {
            return Err(PoolError::AlreadyIdle(worker.id()));
        }

        if worker.status().is_doomed() {
            debug!(
                worker_id = %worker.id(),
                mnemonic = worker.key().mnemonic(),
                status = %worker.status().get(),
                "destroying worker on check-in"
            );
            return Ok(CheckinOutcome::Destroyed);
        }

        if subpool.idle.len() >= subpool.capacity {
            debug!(
                worker_id = %worker.id(),
                mnemonic = worker.key().mnemonic(),
                capacity = subpool.capacity,
                "sub-pool at capacity, destroying returned worker"
            );
            return Ok(CheckinOutcome::Destroyed);
        }

        subpool.idle.push(worker);
        Ok(CheckinOutcome::Parked)
    }

    /// Run a policy over every idle worker of every sub-pool.
    ///
    /// Runs under the pool lock; the policy sees each idle worker exactly
    /// once per sub-pool, and workers the policy answers `Destroy` for are
    /// removed before the lock is released.
    pub fn sweep_with_policy(&self, policy: &mut dyn SweepPolicy) {
        let mut state = self.state.lock();
        for subpool in state.subpools.values_mut() {
            let idle_count = subpool.idle.len();
            subpool
                .idle
                .retain(|worker| policy.visit(worker, idle_count) == Verdict::Keep);
        }
    }

    /// Number of idle workers across all sub-pools.
    pub fn idle_count(&self) -> usize {
        let state = self.state.lock();
        state.subpools.values().map(|sp| sp.idle.len()).sum()
    }

    /// Number of checked-out workers across all sub-pools.
    pub fn checked_out_count(&self) -> usize {
        let state = self.state.lock();
        state.subpools.values().map(|sp| sp.checked_out.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.idle_count() == 0 && self.checked_out_count() == 0
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
