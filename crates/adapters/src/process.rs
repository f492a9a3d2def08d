// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OS process lookup and forcible termination.
//!
//! The per-worker memory cap is enforced by killing the OS process
//! directly, bypassing the pool. Termination is asynchronous: SIGKILL is
//! delivered and the process is reaped whenever its parent gets to it, so
//! `force_terminate` neither blocks nor reports delivery failures beyond a
//! debug log (the process may legitimately already be gone).

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::debug;

/// Handle to one live OS process.
pub trait ProcessHandle: Send {
    fn pid(&self) -> u32;

    /// Deliver SIGKILL. Best-effort; does not wait for the process to die.
    fn force_terminate(&self);
}

/// Resolves pids to process handles.
pub trait ProcessRegistry: Send + Sync {
    /// Returns `None` when no live process has this pid (it already exited
    /// between sampling and enforcement).
    fn lookup(&self, pid: u32) -> Option<Box<dyn ProcessHandle>>;
}

/// Production registry backed by Unix signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixProcessRegistry;

impl ProcessRegistry for UnixProcessRegistry {
    fn lookup(&self, pid: u32) -> Option<Box<dyn ProcessHandle>> {
        // Signal 0 probes existence without delivering anything. EPERM
        // still means the process exists, just under another uid.
        match signal::kill(Pid::from_raw(pid as i32), None) {
            Ok(()) | Err(Errno::EPERM) => Some(Box::new(UnixProcess { pid })),
            Err(_) => None,
        }
    }
}

struct UnixProcess {
    pid: u32,
}

impl ProcessHandle for UnixProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn force_terminate(&self) {
        if let Err(err) = signal::kill(Pid::from_raw(self.pid as i32), Signal::SIGKILL) {
            debug!(pid = self.pid, error = %err, "SIGKILL delivery failed");
        }
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeProcessRegistry;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{ProcessHandle, ProcessRegistry};
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// Fake registry for tests: pids are "live" only when added, and
    /// terminations are recorded instead of delivered.
    #[derive(Clone, Default)]
    pub struct FakeProcessRegistry {
        live: Arc<Mutex<HashSet<u32>>>,
        killed: Arc<Mutex<Vec<u32>>>,
    }

    impl FakeProcessRegistry {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_live(&self, pid: u32) {
            self.live.lock().insert(pid);
        }

        /// Pids that received a forcible termination, in order.
        pub fn killed(&self) -> Vec<u32> {
            self.killed.lock().clone()
        }
    }

    impl ProcessRegistry for FakeProcessRegistry {
        fn lookup(&self, pid: u32) -> Option<Box<dyn ProcessHandle>> {
            if !self.live.lock().contains(&pid) {
                return None;
            }
            Some(Box::new(FakeProcess {
                pid,
                killed: Arc::clone(&self.killed),
            }))
        }
    }

    struct FakeProcess {
        pid: u32,
        killed: Arc<Mutex<Vec<u32>>>,
    }

    impl ProcessHandle for FakeProcess {
        fn pid(&self) -> u32 {
            self.pid
        }

        fn force_terminate(&self) {
            self.killed.lock().push(self.pid);
        }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
