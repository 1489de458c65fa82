//! Access/refresh token persistence

use crate::error::CoreResult;
use crate::storage::{ACCESS_TOKEN_KEY, KeyValueStore, REFRESH_TOKEN_KEY};
use crate::types::CredentialPair;
use std::sync::Arc;
use tracing::{debug, warn};

/// Owns the persisted credential pair.
///
/// Both tokens are written together or not at all: a failed second write
/// restores whatever access token was there before, and a half-written pair
/// found in storage reads as absent.
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The underlying key-value store
    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Persist a new credential pair
    pub fn save(&self, pair: &CredentialPair) -> CoreResult<()> {
        let previous_access = self.store.get(ACCESS_TOKEN_KEY)?;

        self.store.set(ACCESS_TOKEN_KEY, &pair.access_token)?;
        if let Err(err) = self.store.set(REFRESH_TOKEN_KEY, &pair.refresh_token) {
            warn!("Failed to persist refresh token, rolling back access token: {err}");
            let rollback = match previous_access {
                Some(previous) => self.store.set(ACCESS_TOKEN_KEY, &previous),
                None => self.store.remove(ACCESS_TOKEN_KEY),
            };
            if let Err(rollback_err) = rollback {
                warn!("Rollback failed, clearing credentials: {rollback_err}");
                let _ = self.store.remove(ACCESS_TOKEN_KEY);
                let _ = self.store.remove(REFRESH_TOKEN_KEY);
            }
            return Err(err);
        }

        debug!("Saved credential pair");
        Ok(())
    }

    /// Remove both tokens. Both removals are attempted even if the first fails.
    pub fn clear(&self) -> CoreResult<()> {
        let access = self.store.remove(ACCESS_TOKEN_KEY);
        let refresh = self.store.remove(REFRESH_TOKEN_KEY);
        debug!("Cleared credential pair");
        access.and(refresh)
    }

    /// The stored pair, or `None` when either token is missing
    pub fn read(&self) -> CoreResult<Option<CredentialPair>> {
        let access = self.store.get(ACCESS_TOKEN_KEY)?;
        let refresh = self.store.get(REFRESH_TOKEN_KEY)?;

        match (access, refresh) {
            (Some(access), Some(refresh)) => Ok(Some(CredentialPair::new(access, refresh))),
            (None, None) => Ok(None),
            _ => {
                warn!("Found partial credential pair in storage, treating as signed out");
                Ok(None)
            }
        }
    }

    /// Current access token, if any
    pub fn access_token(&self) -> CoreResult<Option<String>> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    /// Current refresh token, if any
    pub fn refresh_token(&self) -> CoreResult<Option<String>> {
        self.store.get(REFRESH_TOKEN_KEY)
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}
