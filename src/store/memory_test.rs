#![allow(clippy::float_cmp)]

use std::sync::Mutex;

use serde_json::json;

use super::*;

fn page(value: serde_json::Value) -> Page {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn save_then_load() {
    let store = MemoryStore::new();
    store.save("world", &page(json!({ "meta": { "category": "Maps" } }))).await.unwrap();
    let loaded = store.load("world").await.unwrap().unwrap();
    assert_eq!(loaded.meta_str("category"), Some("Maps"));
    assert!(store.load("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn save_merges_meta() {
    let store = MemoryStore::new();
    store.save("world", &page(json!({ "meta": { "category": "Maps", "title": "World" } }))).await.unwrap();
    store.save("world", &page(json!({ "meta": { "map": "{}" } }))).await.unwrap();
    let loaded = store.load("world").await.unwrap().unwrap();
    assert_eq!(loaded.meta_str("title"), Some("World"));
    assert_eq!(loaded.meta_str("map"), Some("{}"));
}

#[tokio::test]
async fn writes_publish_snapshots() {
    let store = MemoryStore::new();
    let mut rx = store.subscribe();
    store.save("a", &Page::default()).await.unwrap();
    let StoreEvent::PagesChanged(snapshot) = rx.recv().await.unwrap();
    assert!(snapshot.contains_key("a"));

    store.delete("a").await.unwrap();
    let StoreEvent::PagesChanged(snapshot) = rx.recv().await.unwrap();
    assert!(snapshot.is_empty());
}

#[tokio::test]
async fn deleting_missing_page_is_ok_and_silent() {
    let store = MemoryStore::new();
    let mut rx = store.subscribe();
    store.delete("nothing").await.unwrap();
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn rejected_writes_leave_pages_untouched() {
    let store = MemoryStore::with_pages(PageSnapshot::from([("a".to_string(), Page::default())]));
    store.reject_writes(true);
    assert!(matches!(store.save("b", &Page::default()).await, Err(StoreError::Rejected(_))));
    assert!(store.delete("a").await.is_err());
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn upload_reports_progress_and_stores_binary() {
    let store = MemoryStore::new();
    let seen = Mutex::new(Vec::new());
    let record = |p: f64| seen.lock().unwrap().push(p);
    let bytes = vec![7u8; UPLOAD_CHUNK_BYTES * 2 + 10];

    let url = store.upload("maps/world/1_world.png", bytes, &record).await.unwrap();

    assert_eq!(url, "memory://maps/world/1_world.png");
    assert!(store.has_binary(&url).await);
    let seen = seen.into_inner().unwrap();
    assert_eq!(seen.first(), Some(&0.0));
    assert_eq!(seen.last(), Some(&100.0));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));

    store.delete_binary(&url).await.unwrap();
    assert!(!store.has_binary(&url).await);
    store.delete_binary(&url).await.unwrap();
}

#[tokio::test]
async fn empty_upload_completes() {
    let store = MemoryStore::new();
    let seen = Mutex::new(Vec::new());
    let record = |p: f64| seen.lock().unwrap().push(p);
    store.upload("x", Vec::new(), &record).await.unwrap();
    assert_eq!(seen.into_inner().unwrap(), vec![0.0, 100.0]);
}
