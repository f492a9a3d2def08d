// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
fn parse_duration_seconds() {
    assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
    assert_eq!(parse_duration("45").unwrap(), Duration::from_secs(45));
    assert_eq!(parse_duration(" 10 s ").unwrap(), Duration::from_secs(10));
}

#[test]
fn parse_duration_millis_minutes_hours_days() {
    assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
    assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
    assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
    assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86400));
}

#[test]
fn parse_duration_rejects_garbage() {
    assert!(parse_duration("").is_err());
    assert!(parse_duration("abc").is_err());
    assert!(parse_duration("10fortnights").is_err());
}

#[test]
fn defaults_disable_both_limits() {
    let options = WorkerOptions::default();
    assert_eq!(options.total_worker_memory_limit_mb, 0);
    assert_eq!(options.worker_memory_limit_mb, 0);
    assert!(!options.any_limit_set());
    assert_eq!(options.worker_metrics_poll_interval, Duration::from_secs(5));
    assert!(!options.shrink_worker_pool);
    assert!(!options.worker_verbose);
}

#[test]
fn any_limit_set_when_either_cap_is_positive() {
    let fleet_only = WorkerOptions {
        total_worker_memory_limit_mb: 1000,
        ..Default::default()
    };
    assert!(fleet_only.any_limit_set());

    let per_worker_only = WorkerOptions {
        worker_memory_limit_mb: 500,
        ..Default::default()
    };
    assert!(per_worker_only.any_limit_set());
}

#[test]
fn deserializes_from_partial_config() {
    let options: WorkerOptions = serde_json::from_str(
        r#"{"total_worker_memory_limit_mb": 2048, "worker_metrics_poll_interval": "250ms"}"#,
    )
    .unwrap();
    assert_eq!(options.total_worker_memory_limit_mb, 2048);
    assert_eq!(
        options.worker_metrics_poll_interval,
        Duration::from_millis(250)
    );
    assert_eq!(options.worker_memory_limit_mb, 0);
}

#[test]
fn poll_interval_accepts_integer_seconds() {
    let options: WorkerOptions =
        serde_json::from_str(r#"{"worker_metrics_poll_interval": 30}"#).unwrap();
    assert_eq!(options.worker_metrics_poll_interval, Duration::from_secs(30));
}

#[test]
fn poll_interval_serializes_as_duration_string() {
    let options = WorkerOptions::default();
    let json = serde_json::to_value(&options).unwrap();
    assert_eq!(json["worker_metrics_poll_interval"], "5s");
}

#[test]
#[serial]
fn env_overrides_apply() {
    std::env::set_var("FM_TOTAL_WORKER_MEMORY_LIMIT_MB", "4096");
    std::env::set_var("FM_WORKER_MEMORY_LIMIT_MB", "512");
    std::env::set_var("FM_WORKER_POLL_INTERVAL", "100ms");
    std::env::set_var("FM_SHRINK_WORKER_POOL", "true");
    std::env::set_var("FM_WORKER_VERBOSE", "1");

    let options = WorkerOptions::from_env();
    assert_eq!(options.total_worker_memory_limit_mb, 4096);
    assert_eq!(options.worker_memory_limit_mb, 512);
    assert_eq!(
        options.worker_metrics_poll_interval,
        Duration::from_millis(100)
    );
    assert!(options.shrink_worker_pool);
    assert!(options.worker_verbose);

    for name in [
        "FM_TOTAL_WORKER_MEMORY_LIMIT_MB",
        "FM_WORKER_MEMORY_LIMIT_MB",
        "FM_WORKER_POLL_INTERVAL",
        "FM_SHRINK_WORKER_POOL",
        "FM_WORKER_VERBOSE",
    ] {
        std::env::remove_var(name);
    }
}

#[test]
#[serial]
fn env_garbage_is_ignored() {
    std::env::set_var("FM_TOTAL_WORKER_MEMORY_LIMIT_MB", "lots");
    std::env::set_var("FM_WORKER_POLL_INTERVAL", "0s");

    let mut options = WorkerOptions {
        total_worker_memory_limit_mb: 99,
        ..Default::default()
    };
    options.apply_env();
    // Unparseable number and zero interval both leave prior values alone.
    assert_eq!(options.total_worker_memory_limit_mb, 99);
    assert_eq!(options.worker_metrics_poll_interval, Duration::from_secs(5));

    std::env::remove_var("FM_TOTAL_WORKER_MEMORY_LIMIT_MB");
    std::env::remove_var("FM_WORKER_POLL_INTERVAL");
}
