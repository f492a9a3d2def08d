// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle manager configuration.
//!
//! Options deserialize from host configuration and can be overridden
//! through `FM_*` environment variables, which is how integration harnesses
//! tighten the poll interval.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default poll interval between lifecycle ticks.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Parse a duration string like "500ms", "30s", "5m", "1h" into a Duration
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the numeric prefix
    let (num_str, suffix) = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, ""));

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number in duration: {}", s))?;

    let multiplier = match suffix.trim() {
        "ms" | "millis" | "millisecond" | "milliseconds" => {
            return Ok(Duration::from_millis(num));
        }
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => 86400,
        other => return Err(format!("unknown duration suffix: {}", other)),
    };

    Ok(Duration::from_secs(num * multiplier))
}

/// Configuration for the worker lifecycle manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerOptions {
    /// Aggregate memory budget across all workers, in MB. 0 disables
    /// fleet-cap eviction.
    pub total_worker_memory_limit_mb: u64,

    /// Memory cap for any single worker process, in MB. 0 disables
    /// per-worker killing.
    pub worker_memory_limit_mb: u64,

    /// Interval between metric polls. Must be positive.
    #[serde(with = "poll_interval_serde")]
    pub worker_metrics_poll_interval: Duration,

    /// Also tag not-evicted processes for deferred destruction when the
    /// fleet stays over budget after an eviction pass.
    pub shrink_worker_pool: bool,

    /// Forward informational messages to the user reporter, not only to
    /// the log.
    pub worker_verbose: bool,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            total_worker_memory_limit_mb: 0,
            worker_memory_limit_mb: 0,
            worker_metrics_poll_interval: DEFAULT_POLL_INTERVAL,
            shrink_worker_pool: false,
            worker_verbose: false,
        }
    }
}

impl WorkerOptions {
    /// Whether the lifecycle manager has any work to do at all.
    pub fn any_limit_set(&self) -> bool {
        self.total_worker_memory_limit_mb > 0 || self.worker_memory_limit_mb > 0
    }

    /// Build options from defaults plus `FM_*` environment overrides.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        options.apply_env();
        options
    }

    /// Apply `FM_*` environment variable overrides in place.
    ///
    /// Unparseable values are ignored so a stray variable cannot take the
    /// manager down.
    pub fn apply_env(&mut self) {
        if let Some(mb) = env_u64("FM_TOTAL_WORKER_MEMORY_LIMIT_MB") {
            self.total_worker_memory_limit_mb = mb;
        }
        if let Some(mb) = env_u64("FM_WORKER_MEMORY_LIMIT_MB") {
            self.worker_memory_limit_mb = mb;
        }
        if let Some(interval) = std::env::var("FM_WORKER_POLL_INTERVAL")
            .ok()
            .and_then(|s| parse_duration(&s).ok())
            .filter(|d| !d.is_zero())
        {
            self.worker_metrics_poll_interval = interval;
        }
        if let Some(flag) = env_bool("FM_SHRINK_WORKER_POOL") {
            self.shrink_worker_pool = flag;
        }
        if let Some(flag) = env_bool("FM_WORKER_VERBOSE") {
            self.worker_verbose = flag;
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn env_bool(name: &str) -> Option<bool> {
    match std::env::var(name).ok()?.trim() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Serialize the poll interval as a duration string ("5s") and accept
/// either a string or integer seconds on the way in.
mod poll_interval_serde {
    use super::parse_duration;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if value.subsec_millis() != 0 {
            serializer.serialize_str(&format!("{}ms", value.as_millis()))
        } else {
            serializer.serialize_str(&format!("{}s", value.as_secs()))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
            Raw::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
