// FileCacheStore tests: round trip, overwrite, corrupt and missing files, wire shape

mod common;

use chrono::{TimeZone, Utc};
use common::records;
use cookiefun::cache_store::{CacheStore, FileCacheStore};
use cookiefun::models::{AggregationResult, CacheEntry};
use tempfile::TempDir;

fn entry(ids: &[&str]) -> CacheEntry {
    let ts = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
    CacheEntry::at(ts, AggregationResult::single_page(1, 25, records(ids)))
}

#[tokio::test]
async fn missing_file_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let store = FileCacheStore::open(dir.path()).unwrap();
    assert!(store.get("_7Days").await.is_none());
}

#[tokio::test]
async fn set_then_get_round_trips() {
    let dir = TempDir::new().unwrap();
    let store = FileCacheStore::open(dir.path()).unwrap();
    let e = entry(&["a", "b"]);
    store.set("_7Days", &e).await.unwrap();
    assert_eq!(store.get("_7Days").await, Some(e));
    assert!(dir.path().join("agents_7Days.json").exists());
}

#[tokio::test]
async fn set_overwrites_previous_entry() {
    let dir = TempDir::new().unwrap();
    let store = FileCacheStore::open(dir.path()).unwrap();
    store.set("_3Days", &entry(&["a", "b", "c"])).await.unwrap();
    store.set("_3Days", &entry(&["z"])).await.unwrap();
    let got = store.get("_3Days").await.unwrap();
    assert_eq!(got.result.total_count, 1);
    assert!(!dir.path().join("agents_3Days.json.tmp").exists());
}

#[tokio::test]
async fn corrupt_file_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let store = FileCacheStore::open(dir.path()).unwrap();
    std::fs::write(store.path_for("_7Days"), b"{not json").unwrap();
    assert!(store.get("_7Days").await.is_none());
}

#[tokio::test]
async fn file_uses_flat_wire_shape() {
    let dir = TempDir::new().unwrap();
    let store = FileCacheStore::open(dir.path()).unwrap();
    store.set("_7Days", &entry(&["a"])).await.unwrap();

    let raw = std::fs::read_to_string(store.path_for("_7Days")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    for key in [
        "timestamp",
        "success",
        "partialData",
        "lastSuccessfulPage",
        "data",
        "totalCount",
        "pageSize",
        "currentPage",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert!(json.get("result").is_none());
    assert_eq!(json["timestamp"], "2025-01-15T12:00:00Z");
}

#[tokio::test]
async fn open_creates_missing_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a/b/cache");
    let store = FileCacheStore::open(&nested).unwrap();
    store.set("_7Days", &entry(&["a"])).await.unwrap();
    assert!(nested.join("agents_7Days.json").exists());
}

#[test]
fn path_for_sanitizes_keys() {
    let dir = TempDir::new().unwrap();
    let store = FileCacheStore::open(dir.path()).unwrap();
    let p = store.path_for("../etc");
    assert_eq!(p.parent().unwrap(), dir.path());
}
