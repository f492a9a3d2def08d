// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the lifecycle engine

use thiserror::Error;

/// Errors that can occur starting the lifecycle manager.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to spawn lifecycle thread: {0}")]
    Spawn(#[from] std::io::Error),
}
