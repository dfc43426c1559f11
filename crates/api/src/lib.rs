//! HR Desk API - REST client for leave requests and attendance logs.
//!
//! [`HrApiClient`] implements [`hrdesk_core::store::RecordSource`], so a
//! `MergeStore` pulls and persists status changes through it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hrdesk_api::{ApiClientConfig, HrApiClient};
//!
//! let client = HrApiClient::new(ApiClientConfig::new("https://hr.example.com/api"), session)?;
//! let store = MergeStore::new(Feed::Leave, Arc::new(client));
//! store.pull(&PullParams::new().with("status", "Pending")).await?;
//! ```

mod client;
mod error;
mod types;

pub use client::HrApiClient;
pub use error::{ApiError, Result};
pub use types::*;
