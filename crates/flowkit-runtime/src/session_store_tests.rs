use super::*;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn ctx() -> CancellationToken {
    CancellationToken::new()
}

#[tokio::test]
async fn test_memory_store_missing_session_is_none() {
    let store = MemorySessionStore::new();
    assert!(store.get_session(&ctx(), "nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_memory_store_round_trip() {
    let store = MemorySessionStore::new();
    let state = State::new().with("count", 3).with_meta("user", "ada");
    store.save_session(&ctx(), "s1", &state).await.unwrap();

    let loaded = store.get_session(&ctx(), "s1").await.unwrap().unwrap();
    assert_eq!(loaded, state);
}

#[tokio::test]
async fn test_memory_store_isolates_states() {
    let store = MemorySessionStore::new();
    let state = State::new().with("k", "original");
    store.save_session(&ctx(), "s1", &state).await.unwrap();

    // Mutating the caller's copy after save does not leak into the store.
    state.set("k", "changed");
    let loaded = store.get_session(&ctx(), "s1").await.unwrap().unwrap();
    assert_eq!(loaded.get("k"), Some(json!("original")));

    // Nor does mutating a loaded copy.
    loaded.set("k", "also changed");
    let again = store.get_session(&ctx(), "s1").await.unwrap().unwrap();
    assert_eq!(again.get("k"), Some(json!("original")));
}

#[tokio::test]
async fn test_memory_store_save_replaces_and_keeps_created_at() {
    let store = MemorySessionStore::new();
    store
        .save_session(&ctx(), "s1", &State::new().with("a", 1))
        .await
        .unwrap();
    let created = store.session("s1").await.unwrap().created_at;

    store
        .save_session(&ctx(), "s1", &State::new().with("b", 2))
        .await
        .unwrap();
    let session = store.session("s1").await.unwrap();
    assert_eq!(session.created_at, created);
    assert!(session.state.get("a").is_none());
    assert_eq!(session.state.get("b"), Some(json!(2)));
}

#[tokio::test]
async fn test_memory_store_delete_and_list() {
    let store = MemorySessionStore::new();
    store.save_session(&ctx(), "a", &State::new()).await.unwrap();
    store.save_session(&ctx(), "b", &State::new()).await.unwrap();

    let mut ids = store.list_sessions(&ctx()).await.unwrap();
    ids.sort();
    assert_eq!(ids, vec!["a", "b"]);

    store.delete_session(&ctx(), "a").await.unwrap();
    store.delete_session(&ctx(), "a").await.unwrap();
    assert_eq!(store.list_sessions(&ctx()).await.unwrap(), vec!["b"]);
}

#[tokio::test]
async fn test_memory_store_rejects_empty_id() {
    let store = MemorySessionStore::new();
    let err = store
        .save_session(&ctx(), "", &State::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionStoreError::InvalidId(_)));
}

#[tokio::test]
async fn test_memory_store_concurrent_saves() {
    let store = Arc::new(MemorySessionStore::new());
    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let id = format!("s{i}");
            store
                .save_session(&CancellationToken::new(), &id, &State::new().with("i", i))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(store.list_sessions(&ctx()).await.unwrap().len(), 16);
}

#[tokio::test]
async fn test_file_store_round_trip() {
    let temp = TempDir::new().unwrap();
    let store = FileSessionStore::new(temp.path().join("sessions"));

    assert!(store.get_session(&ctx(), "s1").await.unwrap().is_none());

    let state = State::new().with("answer", 42).with_meta("route_to", "next");
    store.save_session(&ctx(), "s1", &state).await.unwrap();

    let loaded = store.get_session(&ctx(), "s1").await.unwrap().unwrap();
    assert_eq!(loaded, state);
    assert!(temp.path().join("sessions").join("s1.json").exists());
}

#[tokio::test]
async fn test_file_store_delete_and_list() {
    let temp = TempDir::new().unwrap();
    let store = FileSessionStore::new(temp.path());

    assert!(store.list_sessions(&ctx()).await.unwrap().is_empty());
    store.save_session(&ctx(), "b", &State::new()).await.unwrap();
    store.save_session(&ctx(), "a", &State::new()).await.unwrap();
    assert_eq!(store.list_sessions(&ctx()).await.unwrap(), vec!["a", "b"]);

    store.delete_session(&ctx(), "a").await.unwrap();
    store.delete_session(&ctx(), "a").await.unwrap();
    assert_eq!(store.list_sessions(&ctx()).await.unwrap(), vec!["b"]);
}

#[tokio::test]
async fn test_file_store_missing_directory_lists_empty() {
    let temp = TempDir::new().unwrap();
    let store = FileSessionStore::new(temp.path().join("never-created"));
    assert!(store.list_sessions(&ctx()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_file_store_rejects_path_escape() {
    let temp = TempDir::new().unwrap();
    let store = FileSessionStore::new(temp.path());
    let err = store
        .save_session(&ctx(), "../escape", &State::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionStoreError::InvalidId(_)));
    assert!(store.get_session(&ctx(), "a/b").await.is_err());
}

#[tokio::test]
async fn test_file_store_corrupt_file() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("bad.json"), "not json").unwrap();
    let store = FileSessionStore::new(temp.path());
    let err = store.get_session(&ctx(), "bad").await.unwrap_err();
    assert!(matches!(err, SessionStoreError::Serialization(_)));
}
