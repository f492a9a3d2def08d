// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker keys.
//!
//! A key names one class of worker: the action mnemonic plus a fingerprint
//! of everything that affects worker compatibility (tool versions, startup
//! flags, environment). Workers are only interchangeable within a key, so
//! the pool indexes its sub-pools by key.

use fm_core::WorkerKeyHash;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Identity of a worker class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerKey {
    mnemonic: String,
    fingerprint: String,
}

impl WorkerKey {
    pub fn new(mnemonic: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            fingerprint: fingerprint.into(),
        }
    }

    /// Human-readable worker class tag, e.g. "Javac".
    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    /// Opaque digest of the worker's configuration.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Stable hash identifying this key across processes and restarts.
    pub fn hash(&self) -> WorkerKeyHash {
        let mut hasher = Sha256::new();
        hasher.update(self.mnemonic.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.fingerprint.as_bytes());
        let digest = hasher.finalize();
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        WorkerKeyHash::new(hex)
    }
}

impl fmt::Display for WorkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.mnemonic, self.hash().short(8))
    }
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;
