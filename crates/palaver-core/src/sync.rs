//! Realtime message synchronization
//!
//! A subscription keeps one store watch on a conversation's message collection. Every
//! snapshot the watch delivers is decoded, projected and handed to the observer in
//! full; nothing is merged incrementally. For one-to-one conversations each delivery
//! also marks the peer's unseen records as seen, but only while the subscription is
//! focused.
//!
//! Deliveries run on a tokio task, one per subscription. Dropping the [`Subscription`]
//! stops the task and releases the watch; no callback starts after that. Receipt
//! writes already issued are not cancelled.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use palaver_storage_traits::{
    BlobStore, ConversationId, ConversationKind, DocumentStore, GroupMessageRecord,
    MessageRecord, RecordKey, Snapshot, StoreError, UserId, WatchEvent, WatchId,
};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;

use crate::error::Error;
use crate::projection::{self, DisplayMessage};
use crate::{Palaver, Result};

/// Receives the live view of a conversation.
///
/// Called from the subscription's task, never concurrently for one subscription.
pub trait ConversationObserver: Send + Sync {
    /// The full, newest-first view after a change
    fn on_messages(&self, messages: Vec<DisplayMessage>);

    /// The watch ended with an error. Called at most once, after which no more
    /// deliveries happen.
    fn on_error(&self, error: Error);
}

/// One delivery to a channel-backed observer
#[derive(Debug, PartialEq)]
pub enum SyncEvent {
    /// See [`ConversationObserver::on_messages`]
    Messages(Vec<DisplayMessage>),
    /// See [`ConversationObserver::on_error`]
    Error(Error),
}

impl ConversationObserver for flume::Sender<SyncEvent> {
    fn on_messages(&self, messages: Vec<DisplayMessage>) {
        let _ = self.send(SyncEvent::Messages(messages));
    }

    fn on_error(&self, error: Error) {
        let _ = self.send(SyncEvent::Error(error));
    }
}

/// A live conversation view. Dropping it unsubscribes.
pub struct Subscription {
    conversation: ConversationId,
    watch_id: WatchId,
    focused: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
    refresh: flume::Sender<()>,
    store: Arc<dyn DocumentStore>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("conversation", &self.conversation)
            .field("watch_id", &self.watch_id)
            .field("focused", &self.is_focused())
            .field("active", &self.active.load(Ordering::SeqCst))
            .finish()
    }
}

impl Subscription {
    /// The watched conversation
    pub fn conversation(&self) -> &ConversationId {
        &self.conversation
    }

    /// Whether read receipts are currently written
    pub fn is_focused(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }

    /// Updates the focus flag.
    ///
    /// The flag is read on every delivery. Gaining focus also re-delivers the newest
    /// view once, so messages that arrived while unfocused get their receipts without
    /// waiting for the next change.
    pub fn set_focus(&self, focused: bool) {
        let was_focused = self.focused.swap(focused, Ordering::SeqCst);
        if focused && !was_focused {
            let _ = self.refresh.send(());
        }
    }

    /// Stops deliveries and releases the watch
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(task) = self.task.take() {
            // a task mid-poll may outlive abort; it checks this before every callback
            self.active.store(false, Ordering::SeqCst);
            task.abort();
            self.store.unwatch(self.watch_id);
            tracing::info!(
                target: "palaver_core::sync",
                "Unsubscribed from {}",
                self.conversation.as_str()
            );
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// State owned by a subscription's task
struct Pump<Store> {
    store: Arc<Store>,
    conversation: ConversationId,
    local_user: UserId,
    focused: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
    coalesce: bool,
    observer: Arc<dyn ConversationObserver>,
}

impl<Store> Pump<Store>
where
    Store: DocumentStore + 'static,
{
    async fn run(self, events: flume::Receiver<WatchEvent>, refresh: flume::Receiver<()>) {
        let mut latest: Option<Snapshot> = None;
        loop {
            let terminal = tokio::select! {
                event = events.recv_async() => match event {
                    Ok(event) => self.handle(event, &events, &mut latest),
                    Err(_) => break,
                },
                Ok(()) = refresh.recv_async() => self.refresh(&events, &mut latest),
            };

            if let Some(e) = terminal {
                self.fail(e);
                break;
            }
            if !self.is_active() {
                break;
            }
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Delivers one watch event, returning the error that ends the watch if any
    fn handle(
        &self,
        event: WatchEvent,
        events: &flume::Receiver<WatchEvent>,
        latest: &mut Option<Snapshot>,
    ) -> Option<StoreError> {
        let (snapshot, terminal) = match event {
            Ok(snapshot) if self.coalesce => Self::coalesce(snapshot, events),
            Ok(snapshot) => (Some(snapshot), None),
            Err(e) => (None, Some(e)),
        };

        if let Some(snapshot) = snapshot {
            self.deliver(&snapshot);
            *latest = Some(snapshot);
        }
        terminal
    }

    /// Re-delivers the newest view after focus was gained.
    ///
    /// Snapshots still queued are delivered first, in order, so the view never moves
    /// back in time. When the queue was empty the last delivered snapshot is shown
    /// again, which writes the receipts it was delivered without.
    fn refresh(
        &self,
        events: &flume::Receiver<WatchEvent>,
        latest: &mut Option<Snapshot>,
    ) -> Option<StoreError> {
        let mut drained = false;
        while let Ok(event) = events.try_recv() {
            drained = true;
            if let Some(e) = self.handle(event, events, latest) {
                return Some(e);
            }
        }
        if drained {
            return None;
        }
        if let Some(snapshot) = latest.as_ref() {
            tracing::debug!(
                target: "palaver_core::sync",
                "Refreshing {} after focus",
                self.conversation.as_str()
            );
            self.deliver(snapshot);
        }
        None
    }

    fn fail(&self, e: StoreError) {
        tracing::warn!(
            target: "palaver_core::sync",
            "Watch on {} ended: {}",
            self.conversation.as_str(),
            e
        );
        if self.is_active() {
            self.observer.on_error(Error::from(e));
        }
    }

    /// Skips to the newest queued snapshot, stopping at a terminal error
    fn coalesce(
        mut snapshot: Snapshot,
        events: &flume::Receiver<WatchEvent>,
    ) -> (Option<Snapshot>, Option<StoreError>) {
        let mut skipped = 0usize;
        while let Ok(next) = events.try_recv() {
            match next {
                Ok(newer) => {
                    snapshot = newer;
                    skipped += 1;
                }
                Err(e) => return (Some(snapshot), Some(e)),
            }
        }
        if skipped > 0 {
            tracing::debug!(
                target: "palaver_core::sync",
                "Coalesced {} stale snapshots",
                skipped
            );
        }
        (Some(snapshot), None)
    }

    fn deliver(&self, snapshot: &Snapshot) {
        if !self.is_active() {
            return;
        }
        let messages = match self.conversation.kind() {
            ConversationKind::Direct => {
                let records: Vec<(RecordKey, MessageRecord)> =
                    projection::decode_records(snapshot);
                if self.focused.load(Ordering::SeqCst) {
                    self.mark_seen(&records);
                }
                projection::project_direct(records)
            }
            ConversationKind::Group => {
                let records: Vec<(RecordKey, GroupMessageRecord)> =
                    projection::decode_records(snapshot);
                projection::project_group(records)
            }
        };

        tracing::debug!(
            target: "palaver_core::sync",
            "Delivering {} messages for {}",
            messages.len(),
            self.conversation.as_str()
        );
        if self.is_active() {
            self.observer.on_messages(messages);
        }
    }

    /// Writes `seen = true` on every unseen record the peer authored
    fn mark_seen(&self, records: &[(RecordKey, MessageRecord)]) {
        let collection = self.conversation.messages_path();
        for (key, record) in records {
            if !self.is_active() {
                return;
            }
            if record.seen || record.user_id == self.local_user {
                continue;
            }
            let mut fields = Map::new();
            fields.insert("seen".to_string(), Value::Bool(true));
            match self.store.update(&collection.record(key), fields) {
                Ok(()) => {
                    tracing::debug!(target: "palaver_core::sync", "Marked {} seen", key);
                }
                Err(e) => {
                    tracing::warn!(
                        target: "palaver_core::sync",
                        "Failed to mark {} seen: {}",
                        key,
                        e
                    );
                }
            }
        }
    }
}

impl<Store, Blobs> Palaver<Store, Blobs>
where
    Store: DocumentStore + 'static,
    Blobs: BlobStore,
{
    /// Subscribes `observer` to the live view of `conversation` as seen by `local_user`.
    ///
    /// The observer first receives the current view, then a fresh one after every
    /// change. Read receipts are only written while the subscription is focused; see
    /// [`Subscription::set_focus`].
    ///
    /// Fails immediately when the store denies reading the conversation. Access revoked
    /// later is reported once through [`ConversationObserver::on_error`] and ends the
    /// subscription. Nothing is retried.
    pub fn subscribe(
        &self,
        conversation: &ConversationId,
        local_user: &UserId,
        focused: bool,
        observer: Arc<dyn ConversationObserver>,
    ) -> Result<Subscription> {
        let runtime = self.runtime()?;
        let watch = self.store.watch(&conversation.messages_path())?;

        let focused = Arc::new(AtomicBool::new(focused));
        let active = Arc::new(AtomicBool::new(true));
        let (refresh_tx, refresh_rx) = flume::unbounded();
        let pump = Pump {
            store: Arc::clone(&self.store),
            conversation: conversation.clone(),
            local_user: local_user.clone(),
            focused: Arc::clone(&focused),
            active: Arc::clone(&active),
            coalesce: self.config.coalesce_snapshots,
            observer,
        };
        let task = runtime.spawn(pump.run(watch.events, refresh_rx));

        tracing::info!(
            target: "palaver_core::sync",
            "Subscribed to {} as {}",
            conversation.as_str(),
            local_user
        );

        let store: Arc<dyn DocumentStore> = self.store.clone();
        Ok(Subscription {
            conversation: conversation.clone(),
            watch_id: watch.id,
            focused,
            active,
            refresh: refresh_tx,
            store,
            task: Some(task),
        })
    }
}
