//! Merge store: one feed's visible collection, fed by pulls and pushes.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

use super::store_model::{ChangeSource, PullParams, StatusChange, StoreChange};
use super::store_traits::RecordSource;
use crate::errors::Result;
use crate::events::{Feed, RealtimeEvent};
use crate::records::{merge, Collection, Record, RecordKey, RecordSchema};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Internal state. `visible` is always `merge(pulled, overlay)`.
#[derive(Debug, Default)]
struct StoreState {
    /// Last pull result.
    pulled: Collection,
    /// Push-derived and optimistic records, layered over `pulled`.
    overlay: Collection,
    /// Sequence number of the latest overlay write per key.
    overlay_seq: HashMap<RecordKey, u64>,
    next_seq: u64,
    visible: Arc<Collection>,
}

impl StoreState {
    fn write_overlay(&mut self, schema: &RecordSchema, key: RecordKey, record: &Record) {
        let seq = self.next_seq;
        self.next_seq += 1;
        if let Err(e) = self.overlay.upsert(schema, record.clone()) {
            warn!("Overlay write rejected for {}: {}", key, e);
            return;
        }
        self.overlay_seq.insert(key, seq);
    }

    /// Folds the pull into overlay entries written before it was issued.
    /// The pull wins on the fields it carries; fields and sub-collection
    /// entries only the overlay holds are kept.
    fn reconcile_overlay(&mut self, schema: &RecordSchema, issued_at: u64) {
        let stale: Vec<RecordKey> = self
            .overlay_seq
            .iter()
            .filter(|(key, seq)| **seq < issued_at && self.pulled.contains_key(key))
            .map(|(key, _)| key.clone())
            .collect();

        for key in stale {
            if let Some(pulled) = self.pulled.get(&key) {
                self.overlay.upsert_keyed(schema, key, pulled);
            }
        }
    }

    fn rebuild(&mut self, schema: &RecordSchema) {
        self.visible = Arc::new(merge(schema, &self.pulled, &self.overlay));
    }
}

/// Single source of truth for one feed's collection.
///
/// Combines REST pulls with real-time pushes so that the visible collection
/// holds each identity once, with push data winning over the snapshot it
/// arrived after. Readers get immutable snapshots; every mutation publishes
/// a [`StoreChange`].
pub struct MergeStore {
    feed: Feed,
    schema: RecordSchema,
    source: Arc<dyn RecordSource>,
    state: RwLock<StoreState>,
    changes: broadcast::Sender<StoreChange>,
}

impl MergeStore {
    /// Creates a store using the feed's built-in schema.
    pub fn new(feed: Feed, source: Arc<dyn RecordSource>) -> Self {
        Self::with_schema(feed, feed.schema(), source)
    }

    pub fn with_schema(feed: Feed, schema: RecordSchema, source: Arc<dyn RecordSource>) -> Self {
        let (changes, _receiver) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            feed,
            schema,
            source,
            state: RwLock::new(StoreState::default()),
            changes,
        }
    }

    pub fn feed(&self) -> Feed {
        self.feed
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Current visible collection.
    pub fn snapshot(&self) -> Arc<Collection> {
        self.read_state().visible.clone()
    }

    pub fn get(&self, key: &RecordKey) -> Option<Record> {
        self.read_state().visible.get(key).cloned()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    /// Fetches a fresh snapshot and re-merges push data on top of it.
    ///
    /// Concurrent pulls are not deduplicated; the last one to resolve wins.
    /// On failure the collection is left untouched.
    pub async fn pull(&self, params: &PullParams) -> Result<Arc<Collection>> {
        let issued_at = self.read_state().next_seq;
        debug!("Pulling {} feed with {:?}", self.feed, params);

        let records = self.source.fetch(self.feed, params).await?;
        let pulled = Collection::from_records(&self.schema, records);

        let (snapshot, keys) = {
            let mut state = self.write_state();
            state.pulled = pulled;
            state.reconcile_overlay(&self.schema, issued_at);
            state.rebuild(&self.schema);
            (state.visible.clone(), state.visible.keys().to_vec())
        };

        info!(
            "Pulled {} feed: {} records visible",
            self.feed,
            snapshot.len()
        );
        self.publish(ChangeSource::Pull, keys, snapshot.len());
        Ok(snapshot)
    }

    /// Applies one real-time event. Returns the key it touched, or `None`
    /// when the event carried no usable record (the collection is unchanged).
    pub fn ingest(&self, event: &RealtimeEvent) -> Option<RecordKey> {
        let Some(record) = event.data.as_ref() else {
            debug!("Ignoring {} event without payload", event.kind);
            return None;
        };
        let Some(key) = self.schema.key_of(record) else {
            warn!(
                "Ignoring {} event without '{}' identity",
                event.kind,
                self.schema.identity()
            );
            return None;
        };

        let total = {
            let mut state = self.write_state();
            state.write_overlay(&self.schema, key.clone(), record);
            state.rebuild(&self.schema);
            state.visible.len()
        };

        debug!("Merged {} event for {} {}", event.kind, self.feed, key);
        self.publish(ChangeSource::Push, vec![key.clone()], total);
        Some(key)
    }

    /// Optimistically applies `change` to the record and persists it remotely.
    ///
    /// The local update is not rolled back when the remote call fails; the
    /// error is returned to the caller. If no visible record has `key`, only
    /// the remote call is made.
    pub async fn update_status(&self, key: &RecordKey, change: StatusChange) -> Result<()> {
        let applied = {
            let mut state = self.write_state();
            let identity = state
                .visible
                .get(key)
                .and_then(|current| current.get(self.schema.identity()).cloned());
            match identity {
                Some(identity) => {
                    let patch = Record::new(change.patch_fields())
                        .with(self.schema.identity(), identity);
                    state.write_overlay(&self.schema, key.clone(), &patch);
                    state.rebuild(&self.schema);
                    Some(state.visible.len())
                }
                None => None,
            }
        };

        match applied {
            Some(total) => self.publish(ChangeSource::Optimistic, vec![key.clone()], total),
            None => warn!(
                "No {} record {} to update optimistically; sending status change anyway",
                self.feed, key
            ),
        }

        self.source
            .update_status(self.feed, key, &change)
            .await
            .inspect_err(|e| warn!("Status update for {} {} failed: {}", self.feed, key, e))
    }

    fn publish(&self, source: ChangeSource, keys: Vec<RecordKey>, total: usize) {
        // No subscribers is fine.
        let _ = self.changes.send(StoreChange {
            feed: self.feed,
            source,
            keys,
            total,
        });
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for MergeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeStore")
            .field("feed", &self.feed)
            .field("schema", &self.schema)
            .field("visible", &self.snapshot().len())
            .finish()
    }
}
