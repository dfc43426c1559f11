use async_trait::async_trait;

use super::store_model::{PullParams, StatusChange};
use crate::errors::Result;
use crate::events::Feed;
use crate::records::{Record, RecordKey};

/// Remote side of a merge store: the REST listing and status endpoints.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// One-shot fetch of a feed's current snapshot.
    async fn fetch(&self, feed: Feed, params: &PullParams) -> Result<Vec<Record>>;

    /// Persists a status change for one record.
    async fn update_status(&self, feed: Feed, key: &RecordKey, change: &StatusChange)
        -> Result<()>;
}
