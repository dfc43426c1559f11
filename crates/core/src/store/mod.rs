//! Merge stores: pull/push reconciliation of feed collections.

mod feed_router;
mod merge_store;
mod store_model;
mod store_traits;

pub use feed_router::FeedRouter;
pub use merge_store::MergeStore;
pub use store_model::*;
pub use store_traits::*;
