// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fm-adapters: OS touchpoints for the lifecycle manager.
//!
//! Everything the manager needs from the outside world lives behind a
//! trait here so the engine can be tested hermetically: process lookup and
//! forcible termination, and resident-memory sampling.

pub mod metrics;
pub mod process;

pub use metrics::{ResidentMemoryCollector, WorkerRegistration};
pub use process::{ProcessHandle, ProcessRegistry, UnixProcessRegistry};

#[cfg(any(test, feature = "test-support"))]
pub use process::FakeProcessRegistry;
