use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use super::merge_store::MergeStore;
use crate::events::{EventSink, Feed, RealtimeEvent};
use crate::records::RecordKey;

/// Routes real-time events to the merge store of their feed.
#[derive(Clone, Default)]
pub struct FeedRouter {
    stores: HashMap<Feed, Arc<MergeStore>>,
}

impl FeedRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `store` for its feed, replacing any previous one.
    pub fn with_store(mut self, store: Arc<MergeStore>) -> Self {
        self.stores.insert(store.feed(), store);
        self
    }

    pub fn store(&self, feed: Feed) -> Option<&Arc<MergeStore>> {
        self.stores.get(&feed)
    }

    /// Applies `event` to its feed's store. Returns the touched key.
    pub fn route(&self, event: &RealtimeEvent) -> Option<RecordKey> {
        let Some(feed) = event.kind.feed() else {
            debug!("No feed for {} event", event.kind);
            return None;
        };
        match self.stores.get(&feed) {
            Some(store) => store.ingest(event),
            None => {
                debug!("No store registered for {} feed", feed);
                None
            }
        }
    }
}

impl EventSink for FeedRouter {
    fn dispatch(&self, event: RealtimeEvent) {
        self.route(&event);
    }
}
