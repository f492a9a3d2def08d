// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Eviction candidate selection.
//!
//! Candidates are picked largest-first until removing them would bring the
//! fleet under its budget. The selection is deliberately greedy: it
//! maximizes responsiveness toward compliance but does not guarantee the
//! tick achieves it when too much memory is held by busy workers.

use fm_core::WorkerProcessMetrics;
use std::cmp::Ordering;

/// Total order over metrics by resident memory, descending.
///
/// Explicit comparison; a subtraction here would wrap for large samples.
pub fn cmp_memory_desc(a: &WorkerProcessMetrics, b: &WorkerProcessMetrics) -> Ordering {
    b.used_memory_kb.cmp(&a.used_memory_kb)
}

/// Pick the minimum largest-first prefix whose removal brings `used_mb`
/// down to `limit_mb`, using the same truncating MB accounting as the
/// usage sum.
///
/// Returns the prefix in descending-memory order. When no prefix suffices
/// the whole input is returned; when `used_mb > limit_mb` and the input is
/// non-empty, at least one candidate is always returned. Ties keep their
/// input order (the sort is stable).
pub fn select_candidates(
    metrics: &[WorkerProcessMetrics],
    limit_mb: u64,
    used_mb: u64,
) -> Vec<WorkerProcessMetrics> {
    let mut sorted: Vec<WorkerProcessMetrics> = metrics.to_vec();
    sorted.sort_by(cmp_memory_desc);

    let mut candidates = Vec::new();
    let mut freed_mb = 0u64;
    for metric in sorted {
        freed_mb += metric.used_memory_mb();
        candidates.push(metric);
        if used_mb.saturating_sub(freed_mb) <= limit_mb {
            break;
        }
    }
    candidates
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
