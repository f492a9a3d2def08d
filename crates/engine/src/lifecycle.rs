// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker lifecycle manager control loop.
//!
//! Runs on a dedicated thread: sleep for the poll interval, snapshot the
//! fleet's memory metrics, evict the largest idle workers while the
//! aggregate footprint exceeds the fleet cap, then kill any single process
//! over the per-worker cap. Shutdown is cooperative; `stop()` wakes a
//! sleeping loop immediately.
//!
//! Each tick decides from a fresh snapshot. Nothing is promised across
//! ticks, and a tick that cannot reach compliance (the excess is held by
//! checked-out workers) is not an error: the loop tags what it can and
//! waits for the pool's check-in path to finish the job.

use crate::error::LifecycleError;
use crate::reporter::{EventSink, Reporter};
use crate::selector::select_candidates;
use crate::sweep::{CandidateEviction, IdleInspector};
use fm_adapters::{ProcessRegistry, UnixProcessRegistry};
use fm_core::{
    total_memory_mb, Clock, Event, MetricsSource, SystemClock, WorkerId, WorkerOptions,
    WorkerProcessMetrics, WorkerStatus,
};
use fm_pool::WorkerPool;
use parking_lot::{Condvar, Mutex};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Usage summaries are logged at most this often while workers exist.
const USAGE_SUMMARY_PERIOD: Duration = Duration::from_secs(60);

/// Cooperative shutdown flag with an interruptible wait.
struct Shutdown {
    stopped: Mutex<bool>,
    cond: Condvar,
}

impl Shutdown {
    fn new() -> Self {
        Self {
            stopped: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    fn request(&self) {
        *self.stopped.lock() = true;
        self.cond.notify_all();
    }

    fn is_requested(&self) -> bool {
        *self.stopped.lock()
    }

    /// Sleep for `timeout` unless shutdown is requested first.
    /// Returns whether shutdown was requested.
    fn sleep(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.cond.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

/// Suppresses repeat emissions within a period.
struct LogThrottle {
    period: Duration,
    last: Option<Instant>,
}

impl LogThrottle {
    fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.period => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Handle to a running lifecycle manager thread.
pub struct LifecycleHandle {
    shutdown: Arc<Shutdown>,
    join: JoinHandle<()>,
}

impl LifecycleHandle {
    /// Request cooperative shutdown. In-flight work finishes; a sleeping
    /// loop wakes and exits without another sweep.
    pub fn stop(&self) {
        self.shutdown.request();
    }

    /// Wait for the loop to exit.
    pub fn join(self) {
        if self.join.join().is_err() {
            tracing::error!("worker lifecycle thread panicked");
        }
    }

    /// Convenience for `stop()` followed by `join()`.
    pub fn stop_and_join(self) {
        self.stop();
        self.join();
    }
}

/// Kills idle persistent workers at intervals when the fleet's memory
/// usage is above the configured limits. One instance per pool.
pub struct WorkerLifecycleManager {
    pool: Arc<WorkerPool>,
    metrics: Arc<dyn MetricsSource>,
    processes: Arc<dyn ProcessRegistry>,
    options: WorkerOptions,
    clock: Arc<dyn Clock>,
    reporter: Option<Arc<dyn Reporter>>,
    events: Option<Arc<dyn EventSink>>,
    shutdown: Arc<Shutdown>,
    empty_eviction_was_logged: bool,
    usage_summary: LogThrottle,
}

impl WorkerLifecycleManager {
    pub fn new(
        pool: Arc<WorkerPool>,
        metrics: Arc<dyn MetricsSource>,
        options: WorkerOptions,
    ) -> Self {
        Self {
            pool,
            metrics,
            processes: Arc::new(UnixProcessRegistry),
            options,
            clock: Arc::new(SystemClock),
            reporter: None,
            events: None,
            shutdown: Arc::new(Shutdown::new()),
            empty_eviction_was_logged: false,
            usage_summary: LogThrottle::new(USAGE_SUMMARY_PERIOD),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_process_registry(mut self, processes: Arc<dyn ProcessRegistry>) -> Self {
        self.processes = processes;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Start the control loop on its own thread.
    pub fn spawn(self) -> Result<LifecycleHandle, LifecycleError> {
        let shutdown = Arc::clone(&self.shutdown);
        let join = std::thread::Builder::new()
            .name("worker-lifecycle".to_string())
            .spawn(move || {
                let mut manager = self;
                manager.run();
            })?;
        Ok(LifecycleHandle { shutdown, join })
    }

    fn run(&mut self) {
        if !self.options.any_limit_set() {
            return;
        }

        let msg = format!(
            "worker lifecycle manager started (total limit: {} MB, per-worker limit: {} MB, shrinking: {})",
            self.options.total_worker_memory_limit_mb,
            self.options.worker_memory_limit_mb,
            if self.options.shrink_worker_pool {
                "enabled"
            } else {
                "disabled"
            }
        );
        info!("{}", msg);
        self.report_info(&msg);

        loop {
            if self.shutdown.sleep(self.options.worker_metrics_poll_interval) {
                info!("worker lifecycle manager stopping");
                break;
            }

            let metrics = self.metrics.live_metrics();

            if self.options.total_worker_memory_limit_mb > 0 {
                self.evict_workers(&metrics);
                // A stop that landed during the sweeps ends the tick here.
                if self.shutdown.is_requested() {
                    info!("worker lifecycle manager stopping");
                    break;
                }
            }

            if self.options.worker_memory_limit_mb > 0 {
                self.kill_large_workers(&metrics);
            }
        }
    }

    /// Fleet-cap pass: evict the largest idle workers until the aggregate
    /// footprint fits, then optionally tag what could not be evicted.
    fn evict_workers(&mut self, metrics: &[WorkerProcessMetrics]) {
        let limit_mb = self.options.total_worker_memory_limit_mb;
        let used_mb = total_memory_mb(metrics);

        if !metrics.is_empty() && self.usage_summary.ready(self.clock.now()) {
            info!(
                used_mb,
                limit_mb,
                details = %describe_metrics(metrics),
                "total worker memory usage"
            );
        }

        if used_mb <= limit_mb {
            return;
        }

        let candidates = self.collect_eviction_candidates(metrics, limit_mb, used_mb);

        // When the fleet stays over budget because everything sizable is
        // checked out, the same empty outcome would repeat every tick;
        // log the first of each empty run only.
        if !candidates.is_empty() || !self.empty_eviction_was_logged {
            let msg = if candidates.is_empty() {
                format!(
                    "no worker eviction candidates found (usage: {} MB, limit: {} MB)",
                    used_mb, limit_mb
                )
            } else {
                let ids = flat_worker_ids(&candidates);
                format!("attempting eviction of {} workers with ids {:?}", ids.len(), ids)
            };
            info!("{}", msg);
            self.report_info(&msg);
        }

        let freed_mb = total_memory_mb(&candidates);
        if !candidates.is_empty() && used_mb.saturating_sub(freed_mb) > limit_mb {
            info!(
                used_mb,
                limit_mb,
                freed_mb,
                "idle workers alone cannot bring memory usage under the limit"
            );
        }

        let evicted = self.evict_candidates(&candidates);

        if !evicted.is_empty() || !self.empty_eviction_was_logged {
            let ids: Vec<u32> = evicted.iter().map(|id| id.as_u32()).collect();
            let msg = format!("evicted {} idle workers with ids {:?}", ids.len(), ids);
            info!("{}", msg);
            self.report_info(&msg);

            self.empty_eviction_was_logged = candidates.is_empty();
        }

        for metric in metrics {
            for worker_id in &metric.worker_ids {
                if evicted.contains(worker_id) {
                    self.post_event(Event::WorkerEvicted {
                        worker_id: *worker_id,
                        worker_key_hash: metric.worker_key_hash.clone(),
                        mnemonic: metric.mnemonic.clone(),
                    });
                }
            }
        }

        if self.options.shrink_worker_pool {
            let not_evicted: Vec<WorkerProcessMetrics> = metrics
                .iter()
                .filter(|m| !m.worker_ids.iter().all(|id| evicted.contains(id)))
                .cloned()
                .collect();

            let remaining_mb = total_memory_mb(&not_evicted);
            if remaining_mb <= limit_mb {
                return;
            }

            self.postpone_invalidation(&not_evicted, limit_mb, remaining_mb);
        }
    }

    /// Select the largest idle workers whose removal would fit the fleet
    /// under its cap. Only workers observed idle by the pool's own
    /// iteration are eligible; a process qualifies when any of its logical
    /// ids is idle.
    fn collect_eviction_candidates(
        &self,
        metrics: &[WorkerProcessMetrics],
        limit_mb: u64,
        used_mb: u64,
    ) -> Vec<WorkerProcessMetrics> {
        let mut inspector = IdleInspector::new();
        self.pool.sweep_with_policy(&mut inspector);
        let idle = inspector.into_worker_ids();

        let idle_metrics: Vec<WorkerProcessMetrics> = metrics
            .iter()
            .filter(|m| m.worker_ids.iter().any(|id| idle.contains(id)))
            .cloned()
            .collect();

        select_candidates(&idle_metrics, limit_mb, used_mb)
    }

    /// Destructive sweep over the candidates. Not every candidate is
    /// guaranteed to be evicted: one that got checked out since inspection
    /// escapes. Returns the ids destruction was signalled for.
    fn evict_candidates(&self, candidates: &[WorkerProcessMetrics]) -> BTreeSet<WorkerId> {
        let mut policy = CandidateEviction::new(candidates);
        self.pool.sweep_with_policy(&mut policy);
        policy.into_evicted()
    }

    /// Shrink step: the fleet is still over budget after eviction, so tag
    /// further largest-first processes for destruction at their next
    /// check-in. No events fire here; they fire if and when the kill
    /// actually happens.
    fn postpone_invalidation(
        &self,
        metrics: &[WorkerProcessMetrics],
        limit_mb: u64,
        used_mb: u64,
    ) {
        let potential = select_candidates(metrics, limit_mb, used_mb);
        if potential.is_empty() {
            return;
        }

        let ids = flat_worker_ids(&potential);
        let msg = format!("postponing eviction of workers with ids {:?}", ids);
        info!("{}", msg);
        self.report_info(&msg);

        for metric in &potential {
            metric
                .status
                .maybe_update(WorkerStatus::PendingKillDueToMemoryPressure);
        }
    }

    /// Per-worker-cap pass: kill any process over the limit directly,
    /// without coordinating with the pool. A worker this far over its cap
    /// is treated as malfunctioning; the pool discovers the death on next
    /// use.
    fn kill_large_workers(&self, metrics: &[WorkerProcessMetrics]) {
        let limit_mb = self.options.worker_memory_limit_mb;

        for metric in metrics.iter().filter(|m| m.used_memory_mb() > limit_mb) {
            let Some(process) = self.processes.lookup(metric.pid) else {
                debug!(pid = metric.pid, "worker process already gone, skipping kill");
                continue;
            };

            let ids = flat_worker_ids(std::slice::from_ref(metric));
            let msg = format!(
                "killing {} worker {:?} (pid {}) using more memory than the limit ({} MB > {} MB)",
                metric.mnemonic,
                ids,
                metric.pid,
                metric.used_memory_mb(),
                limit_mb
            );
            info!("{}", msg);

            process.force_terminate();
            let was_killed = metric
                .status
                .maybe_update(WorkerStatus::KilledDueToMemoryPressure);

            // A kill can fail an in-flight action, so the user sees this
            // regardless of verbosity.
            self.report_warn(&msg);

            if was_killed {
                for worker_id in &metric.worker_ids {
                    self.post_event(Event::WorkerEvicted {
                        worker_id: *worker_id,
                        worker_key_hash: metric.worker_key_hash.clone(),
                        mnemonic: metric.mnemonic.clone(),
                    });
                }
            }
        }
    }

    fn report_info(&self, message: &str) {
        if !self.options.worker_verbose {
            return;
        }
        if let Some(reporter) = &self.reporter {
            reporter.info(message);
        }
    }

    fn report_warn(&self, message: &str) {
        if let Some(reporter) = &self.reporter {
            reporter.warn(message);
        }
    }

    fn post_event(&self, event: Event) {
        if let Some(events) = &self.events {
            events.post(event);
        }
    }
}

/// Deduplicated logical worker ids across the given metrics, ascending.
fn flat_worker_ids(metrics: &[WorkerProcessMetrics]) -> Vec<u32> {
    let ids: BTreeSet<u32> = metrics
        .iter()
        .flat_map(|m| m.worker_ids.iter().map(|id| id.as_u32()))
        .collect();
    ids.into_iter().collect()
}

/// One-line usage breakdown for the throttled summary log.
fn describe_metrics(metrics: &[WorkerProcessMetrics]) -> String {
    metrics
        .iter()
        .map(|m| {
            let ids: Vec<u32> = m.worker_ids.iter().map(|id| id.as_u32()).collect();
            format!("{:?} {} {} KiB", ids, m.mnemonic, m.used_memory_kb)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
