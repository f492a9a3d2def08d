// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_handle_starts_alive() {
    let status = StatusHandle::new();
    assert_eq!(status.get(), WorkerStatus::Alive);
    assert!(!status.is_doomed());
}

#[test]
fn forward_transitions_succeed() {
    let status = StatusHandle::new();
    assert!(status.maybe_update(WorkerStatus::PendingKillDueToMemoryPressure));
    assert_eq!(status.get(), WorkerStatus::PendingKillDueToMemoryPressure);
    assert!(status.maybe_update(WorkerStatus::KilledDueToMemoryPressure));
    assert_eq!(status.get(), WorkerStatus::KilledDueToMemoryPressure);
}

#[test]
fn backward_transitions_are_noops() {
    let status = StatusHandle::new();
    status.maybe_update(WorkerStatus::KilledDueToMemoryPressure);
    assert!(!status.maybe_update(WorkerStatus::PendingKillDueToMemoryPressure));
    assert!(!status.maybe_update(WorkerStatus::Alive));
    assert_eq!(status.get(), WorkerStatus::KilledDueToMemoryPressure);
}

#[test]
fn same_state_update_returns_false() {
    let status = StatusHandle::new();
    assert!(status.maybe_update(WorkerStatus::KilledDueToMemoryPressure));
    // Second kill observes the transition already happened.
    assert!(!status.maybe_update(WorkerStatus::KilledDueToMemoryPressure));
}

#[test]
fn skipping_pending_kill_is_allowed() {
    let status = StatusHandle::new();
    assert!(status.maybe_update(WorkerStatus::KilledDueToMemoryPressure));
    assert_eq!(status.get(), WorkerStatus::KilledDueToMemoryPressure);
}

#[test]
fn clones_share_state() {
    let status = StatusHandle::new();
    let other = status.clone();
    other.maybe_update(WorkerStatus::PendingKillDueToMemoryPressure);
    assert!(status.is_doomed());
}

#[test]
fn concurrent_upgrades_race_safely() {
    let status = StatusHandle::new();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let status = status.clone();
            std::thread::spawn(move || status.maybe_update(WorkerStatus::KilledDueToMemoryPressure))
        })
        .collect();
    let transitions: usize = handles
        .into_iter()
        .map(|h| usize::from(h.join().unwrap()))
        .sum();
    // Exactly one thread wins the terminal transition.
    assert_eq!(transitions, 1);
    assert_eq!(status.get(), WorkerStatus::KilledDueToMemoryPressure);
}

#[test]
fn display_is_human_readable() {
    assert_eq!(WorkerStatus::Alive.to_string(), "alive");
    assert_eq!(
        WorkerStatus::PendingKillDueToMemoryPressure.to_string(),
        "pending kill (memory pressure)"
    );
    assert_eq!(
        WorkerStatus::KilledDueToMemoryPressure.to_string(),
        "killed (memory pressure)"
    );
}
