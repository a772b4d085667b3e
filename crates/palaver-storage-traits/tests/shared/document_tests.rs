//! Document store test functions

use palaver_storage_traits::{DocumentStore, StoreError, WatchEvent};
use serde_json::{Map, json};

use super::path;

fn drain(events: &flume::Receiver<WatchEvent>) -> Vec<WatchEvent> {
    events.try_iter().collect()
}

/// Values written with `set` are read back unchanged
pub fn test_set_then_get<S>(store: S)
where
    S: DocumentStore,
{
    let target = path("profiles/u1");
    assert_eq!(store.get(&target).unwrap(), None);

    store
        .set(&target, json!({"pseudo": "ana", "isConnected": true}))
        .unwrap();
    assert_eq!(
        store.get(&target).unwrap(),
        Some(json!({"pseudo": "ana", "isConnected": true}))
    );

    // overwrite replaces the whole node
    store.set(&target, json!({"pseudo": "bea"})).unwrap();
    assert_eq!(store.get(&target).unwrap(), Some(json!({"pseudo": "bea"})));

    // null deletes
    store.set(&target, json!(null)).unwrap();
    assert_eq!(store.get(&target).unwrap(), None);
}

/// `update` only touches the named children
pub fn test_update_merges_fields<S>(store: S)
where
    S: DocumentStore,
{
    let target = path("chats/a_b/k1");
    store
        .set(&target, json!({"text": "hi", "seen": false, "userId": "a"}))
        .unwrap();

    let mut fields = Map::new();
    fields.insert("seen".to_string(), json!(true));
    store.update(&target, fields).unwrap();

    assert_eq!(
        store.get(&target).unwrap(),
        Some(json!({"text": "hi", "seen": true, "userId": "a"}))
    );
}

/// Appends get unique keys and never overwrite each other
pub fn test_push_appends_distinct_records<S>(store: S)
where
    S: DocumentStore,
{
    let collection = path("chats/a_b");
    let mut keys = Vec::new();
    for _ in 0..10 {
        keys.push(store.push(&collection, json!({"text": "same"})).unwrap());
    }

    let mut sorted = keys.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), 10);

    let stored = store.get(&collection).unwrap().unwrap();
    assert_eq!(stored.as_object().unwrap().len(), 10);
    for key in &keys {
        assert_eq!(
            store.get(&collection.record(key)).unwrap(),
            Some(json!({"text": "same"}))
        );
    }
}

/// A watch sees the current value first and then every change, in order
pub fn test_watch_sees_changes_in_order<S>(store: S)
where
    S: DocumentStore,
{
    let collection = path("chats/a_b");
    store.set(&collection.child("k0").unwrap(), json!(0)).unwrap();

    let watch = store.watch(&collection).unwrap();
    for i in 1..=5 {
        store
            .set(&collection.child(&format!("k{i}")).unwrap(), json!(i))
            .unwrap();
    }

    let events = drain(&watch.events);
    assert_eq!(events.len(), 6);
    for (i, event) in events.iter().enumerate() {
        let snapshot = event.as_ref().unwrap();
        assert_eq!(snapshot.path, collection);
        assert_eq!(snapshot.children().unwrap().len(), i + 1);
    }

    store.unwatch(watch.id);
}

/// Writes elsewhere in the tree are not delivered
pub fn test_watch_ignores_unrelated_paths<S>(store: S)
where
    S: DocumentStore,
{
    let watch = store.watch(&path("chats/a_b")).unwrap();
    let _ = drain(&watch.events);

    store.set(&path("chats/a_c/k"), json!(1)).unwrap();
    store.set(&path("profiles/a"), json!({"pseudo": "a"})).unwrap();
    assert!(drain(&watch.events).is_empty());

    store.unwatch(watch.id);
}

/// After `unwatch`, no further events arrive
pub fn test_unwatch_stops_deliveries<S>(store: S)
where
    S: DocumentStore,
{
    let collection = path("chats/a_b");
    let watch = store.watch(&collection).unwrap();
    let _ = drain(&watch.events);

    store.unwatch(watch.id);
    store.set(&collection.child("k").unwrap(), json!(1)).unwrap();

    assert!(
        drain(&watch.events)
            .into_iter()
            .all(|event| event.is_err())
    );
    // releasing twice is harmless
    store.unwatch(watch.id);
}

/// Invalid keys inside written objects are rejected
pub fn test_rejects_invalid_keys<S>(store: S)
where
    S: DocumentStore,
{
    let result = store.set(&path("chats/a_b"), json!({"bad.key": 1}));
    assert!(matches!(result, Err(StoreError::InvalidPath(_))));
    assert_eq!(store.get(&path("chats/a_b")).unwrap(), None);
}
