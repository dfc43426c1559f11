//! Session token handling and persistence.

mod credential_store;
#[allow(clippy::module_inception)]
mod session;

pub use credential_store::{CredentialStore, FileCredentialStore, InMemoryCredentialStore};
pub use session::{AuthState, Session};
