// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker process status state machine.
//!
//! The status is shared between the lifecycle manager and the pool's
//! check-in path, so transitions are CAS-based and only ever move a worker
//! toward "more dead": `Alive < PendingKillDueToMemoryPressure <
//! KilledDueToMemoryPressure`. A stale writer can never resurrect a worker.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle status of a worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    /// Worker is live and usable.
    Alive,
    /// Marked for destruction; the pool must destroy the worker instead of
    /// parking it on next check-in.
    PendingKillDueToMemoryPressure,
    /// Terminal: the OS process has been forcibly terminated.
    KilledDueToMemoryPressure,
}

impl WorkerStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => WorkerStatus::Alive,
            1 => WorkerStatus::PendingKillDueToMemoryPressure,
            _ => WorkerStatus::KilledDueToMemoryPressure,
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerStatus::Alive => write!(f, "alive"),
            WorkerStatus::PendingKillDueToMemoryPressure => {
                write!(f, "pending kill (memory pressure)")
            }
            WorkerStatus::KilledDueToMemoryPressure => write!(f, "killed (memory pressure)"),
        }
    }
}

/// Shared, atomically-updated handle to a worker process's status.
///
/// Cloning yields a handle to the same underlying status. Both the
/// lifecycle manager and the pool hold one; no back-pointer between them
/// is needed.
#[derive(Debug, Clone)]
pub struct StatusHandle(Arc<AtomicU8>);

impl StatusHandle {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU8::new(WorkerStatus::Alive as u8)))
    }

    pub fn get(&self) -> WorkerStatus {
        WorkerStatus::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Upgrade the status to `next` if that is a forward transition.
    ///
    /// Returns whether the transition actually occurred. A no-op (current
    /// state already at or beyond `next`) returns `false`, which callers use
    /// to deduplicate follow-up work such as event posting.
    pub fn maybe_update(&self, next: WorkerStatus) -> bool {
        let mut current = self.0.load(Ordering::SeqCst);
        loop {
            if next as u8 <= current {
                return false;
            }
            match self
                .0
                .compare_exchange(current, next as u8, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Whether the worker is tagged for destruction or already killed.
    pub fn is_doomed(&self) -> bool {
        self.get() >= WorkerStatus::PendingKillDueToMemoryPressure
    }
}

impl Default for StatusHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
