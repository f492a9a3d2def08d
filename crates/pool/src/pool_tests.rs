// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fm_core::WorkerStatus;

fn key(mnemonic: &str) -> WorkerKey {
    WorkerKey::new(mnemonic, "fp")
}

fn worker(id: u32, key: &WorkerKey) -> Worker {
    Worker::new(WorkerId::new(id), key.clone(), 10_000 + id)
}

/// Policy destroying a fixed id set, recording everything it visited.
#[derive(Default)]
struct DestroySet {
    targets: HashSet<WorkerId>,
    visited: Vec<(WorkerId, usize)>,
}

impl DestroySet {
    fn targeting(ids: &[u32]) -> Self {
        Self {
            targets: ids.iter().map(|id| WorkerId::new(*id)).collect(),
            visited: Vec::new(),
        }
    }
}

impl SweepPolicy for DestroySet {
    fn visit(&mut self, worker: &Worker, idle_count: usize) -> Verdict {
        self.visited.push((worker.id(), idle_count));
        if self.targets.contains(&worker.id()) {
            Verdict::Destroy
        } else {
            Verdict::Keep
        }
    }
}

#[test]
fn checkout_and_checkin_roundtrip() {
    let pool = WorkerPool::new();
    let javac = key("Javac");
    pool.checkin(worker(1, &javac)).unwrap();
    assert_eq!(pool.idle_count(), 1);

    let borrowed = pool.checkout(&javac).expect("idle worker available");
    assert_eq!(borrowed.id(), WorkerId::new(1));
    assert_eq!(pool.idle_count(), 0);
    assert_eq!(pool.checked_out_count(), 1);

    assert_eq!(pool.checkin(borrowed).unwrap(), CheckinOutcome::Parked);
    assert_eq!(pool.idle_count(), 1);
    assert_eq!(pool.checked_out_count(), 0);
}

#[test]
fn checkout_of_unknown_key_is_none() {
    let pool = WorkerPool::new();
    assert!(pool.checkout(&key("Javac")).is_none());
}

#[test]
fn checkin_destroys_pending_kill_worker() {
    let pool = WorkerPool::new();
    let javac = key("Javac");
    let w = worker(1, &javac);
    w.status().maybe_update(WorkerStatus::PendingKillDueToMemoryPressure);

    assert_eq!(pool.checkin(w).unwrap(), CheckinOutcome::Destroyed);
    assert!(pool.is_empty());
}

#[test]
fn checkout_skips_doomed_idle_workers() {
    let pool = WorkerPool::new();
    let javac = key("Javac");
    let w = worker(1, &javac);
    let status = w.status();
    pool.checkin(w).unwrap();
    // Tagged while parked (the lifecycle manager's deferred-kill path).
    status.maybe_update(WorkerStatus::PendingKillDueToMemoryPressure);

    assert!(pool.checkout(&javac).is_none());
    assert!(pool.is_empty());
}

#[test]
fn checkin_beyond_capacity_destroys() {
    let pool = WorkerPool::with_default_capacity(1);
    let javac = key("Javac");
    assert_eq!(pool.checkin(worker(1, &javac)).unwrap(), CheckinOutcome::Parked);
    assert_eq!(
        pool.checkin(worker(2, &javac)).unwrap(),
        CheckinOutcome::Destroyed
    );
    assert_eq!(pool.idle_count(), 1);
}

#[test]
fn set_capacity_overrides_default() {
    let pool = WorkerPool::with_default_capacity(1);
    let javac = key("Javac");
    pool.set_capacity(&javac, 2);
    assert_eq!(pool.checkin(worker(1, &javac)).unwrap(), CheckinOutcome::Parked);
    assert_eq!(pool.checkin(worker(2, &javac)).unwrap(), CheckinOutcome::Parked);
    assert_eq!(pool.idle_count(), 2);
}

#[test]
fn double_checkin_is_an_error() {
    let pool = WorkerPool::new();
    let javac = key("Javac");
    pool.checkin(worker(1, &javac)).unwrap();
    let result = pool.checkin(worker(1, &javac));
    assert!(matches!(result, Err(PoolError::AlreadyIdle(id)) if id == WorkerId::new(1)));
}

#[test]
fn sweep_visits_only_idle_workers() {
    let pool = WorkerPool::new();
    let javac = key("Javac");
    pool.checkin(worker(1, &javac)).unwrap();
    pool.checkin(worker(2, &javac)).unwrap();
    let busy = pool.checkout(&javac).expect("worker available");

    let mut policy = DestroySet::default();
    pool.sweep_with_policy(&mut policy);

    let visited: Vec<WorkerId> = policy.visited.iter().map(|(id, _)| *id).collect();
    assert_eq!(visited.len(), 1);
    assert!(!visited.contains(&busy.id()));
}

#[test]
fn sweep_passes_sub_pool_idle_count() {
    let pool = WorkerPool::new();
    let javac = key("Javac");
    let cpp = key("CppCompile");
    pool.checkin(worker(1, &javac)).unwrap();
    pool.checkin(worker(2, &javac)).unwrap();
    pool.checkin(worker(3, &cpp)).unwrap();

    let mut policy = DestroySet::default();
    pool.sweep_with_policy(&mut policy);

    for (id, idle_count) in &policy.visited {
        let expected = if *id == WorkerId::new(3) { 1 } else { 2 };
        assert_eq!(*idle_count, expected, "idle count for worker {}", id);
    }
}

#[test]
fn destructive_sweep_removes_targets_and_keeps_the_rest() {
    let pool = WorkerPool::new();
    let javac = key("Javac");
    pool.checkin(worker(1, &javac)).unwrap();
    pool.checkin(worker(2, &javac)).unwrap();
    pool.checkin(worker(3, &javac)).unwrap();

    let mut policy = DestroySet::targeting(&[1, 3]);
    pool.sweep_with_policy(&mut policy);

    assert_eq!(pool.idle_count(), 1);
    let survivor = pool.checkout(&javac).expect("one worker left");
    assert_eq!(survivor.id(), WorkerId::new(2));
}

#[test]
fn checked_out_worker_escapes_destructive_sweep() {
    let pool = WorkerPool::new();
    let javac = key("Javac");
    pool.checkin(worker(1, &javac)).unwrap();
    let busy = pool.checkout(&javac).expect("worker available");

    let mut policy = DestroySet::targeting(&[1]);
    pool.sweep_with_policy(&mut policy);
    assert!(policy.visited.is_empty());

    // Still alive and returnable.
    assert_eq!(pool.checkin(busy).unwrap(), CheckinOutcome::Parked);
    assert_eq!(pool.idle_count(), 1);
}
