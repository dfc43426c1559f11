use log::{info, warn};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;

use super::credential_store::CredentialStore;
use crate::errors::{Error, Result};

/// Authentication state published to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    SignedIn,
    SignedOut,
}

/// Holds the bearer token shared by the REST client and the transport.
///
/// The token is cached in memory and mirrored to a [`CredentialStore`].
/// Invalidating the session (for example after a 401) clears both and
/// publishes [`AuthState::SignedOut`].
pub struct Session {
    store: Arc<dyn CredentialStore>,
    token: RwLock<Option<String>>,
    state: watch::Sender<AuthState>,
}

impl Session {
    /// Restores any token persisted in `store`.
    pub fn restore(store: Arc<dyn CredentialStore>) -> Result<Self> {
        let token = store.load()?;
        let initial = if token.is_some() {
            AuthState::SignedIn
        } else {
            AuthState::SignedOut
        };
        let (state, _receiver) = watch::channel(initial);
        Ok(Self {
            store,
            token: RwLock::new(token),
            state,
        })
    }

    /// Stores `token` and marks the session signed in.
    pub fn sign_in(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::Credential("Token must not be empty".into()));
        }
        self.store.save(&token)?;
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token);
        self.state.send_replace(AuthState::SignedIn);
        info!("Session signed in");
        Ok(())
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn require_token(&self) -> Result<String> {
        self.token().ok_or(Error::Unauthorized)
    }

    pub fn is_signed_in(&self) -> bool {
        *self.state.borrow() == AuthState::SignedIn
    }

    /// Clears the token locally and in the credential store.
    pub fn invalidate(&self) {
        let had_token = self
            .token
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .is_some();
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear stored credentials: {}", e);
        }
        if had_token {
            info!("Session invalidated");
        }
        self.state.send_replace(AuthState::SignedOut);
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}
