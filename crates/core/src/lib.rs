//! HRDesk Core - record model, merge stores and session handling.
//!
//! This crate holds the transport-agnostic logic of the HR admin client:
//! dynamic records, the pull/push merge stores for leave requests and
//! attendance logs, and the bearer-token session. Network access is
//! abstracted behind [`store::RecordSource`] and implemented by `hrdesk-api`.

pub mod errors;
pub mod events;
pub mod leave;
pub mod records;
pub mod session;
pub mod store;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
