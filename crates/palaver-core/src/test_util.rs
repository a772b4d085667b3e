//! Test utilities for the palaver-core crate

use std::sync::Arc;
use std::time::Duration;

use palaver_memory_storage::{MemoryBlobStore, MemoryStore};

use crate::Palaver;
use crate::config::PalaverConfig;
use crate::dispatch::SenderIdentity;
use crate::projection::DisplayMessage;
use crate::sync::SyncEvent;

/// How long to wait for a delivery before failing the test
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(2);

/// How long to wait before concluding nothing else is coming
pub const QUIET_PERIOD: Duration = Duration::from_millis(100);

/// A client over fresh memory stores, plus handles on both stores
pub fn palaver() -> (
    Palaver<MemoryStore, MemoryBlobStore>,
    Arc<MemoryStore>,
    Arc<MemoryBlobStore>,
) {
    palaver_with(PalaverConfig::default())
}

/// Like [`palaver`], with `config` applied
pub fn palaver_with(
    config: PalaverConfig,
) -> (
    Palaver<MemoryStore, MemoryBlobStore>,
    Arc<MemoryStore>,
    Arc<MemoryBlobStore>,
) {
    let store = Arc::new(MemoryStore::new());
    let blobs = Arc::new(MemoryBlobStore::with_base_url("https://files.test"));
    let palaver = Palaver::builder(Arc::clone(&store), Arc::clone(&blobs))
        .with_config(config)
        .build();
    (palaver, store, blobs)
}

/// Sender identity for test user `id`
pub fn sender(id: &str) -> SenderIdentity {
    SenderIdentity {
        user_id: palaver_storage_traits::test_utils::user(id),
        user_name: format!("{id}-name"),
        avatar: Some(format!("https://img.test/{id}.jpg")),
    }
}

/// Next event on a channel observer, failing the test on timeout
pub async fn next_event(rx: &flume::Receiver<SyncEvent>) -> SyncEvent {
    tokio::time::timeout(DELIVERY_TIMEOUT, rx.recv_async())
        .await
        .expect("timed out waiting for a delivery")
        .expect("observer channel closed")
}

/// Next message delivery, failing the test on an error delivery
pub async fn next_messages(rx: &flume::Receiver<SyncEvent>) -> Vec<DisplayMessage> {
    match next_event(rx).await {
        SyncEvent::Messages(messages) => messages,
        SyncEvent::Error(e) => panic!("unexpected error delivery: {e}"),
    }
}

/// Asserts that nothing is delivered during [`QUIET_PERIOD`]
pub async fn no_event(rx: &flume::Receiver<SyncEvent>) {
    if let Ok(Ok(event)) = tokio::time::timeout(QUIET_PERIOD, rx.recv_async()).await {
        panic!("unexpected delivery: {event:?}");
    }
}
