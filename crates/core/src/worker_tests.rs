// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

#[test]
fn worker_id_display_and_accessors() {
    let id = WorkerId::new(7);
    assert_eq!(id.as_u32(), 7);
    assert_eq!(id.to_string(), "7");
    assert_eq!(WorkerId::from(7), id);
}

#[test]
fn worker_id_orders_numerically() {
    let mut ids = vec![WorkerId::new(10), WorkerId::new(2), WorkerId::new(7)];
    ids.sort();
    assert_eq!(ids, vec![WorkerId::new(2), WorkerId::new(7), WorkerId::new(10)]);
}

#[test]
fn worker_id_serde_is_a_bare_number() {
    let json = serde_json::to_string(&WorkerId::new(3)).unwrap();
    assert_eq!(json, "3");
    let id: WorkerId = serde_json::from_str("3").unwrap();
    assert_eq!(id, WorkerId::new(3));
}

#[test]
fn key_hash_new_and_display() {
    let hash = WorkerKeyHash::new("cafebabe");
    assert_eq!(hash.as_str(), "cafebabe");
    assert_eq!(hash.to_string(), "cafebabe");
    assert_eq!(hash, "cafebabe");
}

#[test]
fn key_hash_short_truncates_for_logs() {
    let hash = WorkerKeyHash::new("0123456789abcdef");
    assert_eq!(hash.short(8), "01234567");
    assert_eq!(WorkerKeyHash::new("abc").short(8), "abc");
}

#[test]
fn key_hash_borrow_allows_map_lookup_by_str() {
    let mut map = HashMap::new();
    map.insert(WorkerKeyHash::new("k"), 1);
    assert_eq!(map.get("k"), Some(&1));
}

#[test]
fn key_hash_serde_roundtrip() {
    let hash = WorkerKeyHash::new("deadbeef");
    let json = serde_json::to_string(&hash).unwrap();
    assert_eq!(json, "\"deadbeef\"");
    let back: WorkerKeyHash = serde_json::from_str(&json).unwrap();
    assert_eq!(back, hash);
}
