//! User session store
//!
//! [`SessionStore`] owns the signed-in state of the panel: whether a
//! credential pair is held and which profile it belongs to. It is a cheap
//! handle; clones share the same state.

use crate::guard::RouteGuard;
use crate::navigator::Navigator;
use goftr_admin_core::storage::USER_KEY;
use goftr_admin_core::{
    CoreError, CredentialPair, LoginRequest, Role, TokenStore, UserProfile, Validate,
    ValidationErrors,
};
use goftr_admin_http::{AdminClient, ClientError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Session error types
#[derive(Debug, Error)]
pub enum SessionError {
    /// Credential or profile cache storage failed
    #[error("Session storage error: {0}")]
    Storage(#[from] CoreError),

    /// Sign-in form rejected before it was sent
    #[error("Invalid credentials form: {0}")]
    Validation(#[from] ValidationErrors),

    /// The API refused the credentials
    #[error("Sign in failed: {0}")]
    SignIn(#[source] ClientError),

    /// `/users/me` could not be fetched
    #[error("Failed to fetch profile: {0}")]
    Profile(#[source] ClientError),
}

/// Snapshot of the session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
}

impl SessionState {
    /// Role of the cached profile; `None` until a profile is known
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|user| user.role)
    }

    /// `true` without a filter, otherwise whether the current role is listed
    pub fn has_role(&self, roles: Option<&[Role]>) -> bool {
        match roles {
            None => true,
            Some(roles) => self.role().is_some_and(|role| roles.contains(&role)),
        }
    }
}

struct SessionInner {
    client: AdminClient,
    navigator: Arc<dyn Navigator>,
    guard: RouteGuard,
    state: RwLock<SessionState>,
    // Bumped on every login and logout; profile fetches started under an
    // older epoch are dropped.
    epoch: AtomicU64,
}

/// Shared session handle
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

impl SessionStore {
    /// Create a session and restore it from the client's durable storage
    pub fn new(client: AdminClient, navigator: Arc<dyn Navigator>, guard: RouteGuard) -> Self {
        let store = Self {
            inner: Arc::new(SessionInner {
                client,
                navigator,
                guard,
                state: RwLock::new(SessionState::default()),
                epoch: AtomicU64::new(0),
            }),
        };
        store.restore();
        store
    }

    /// Reload the session from durable storage.
    ///
    /// The session counts as authenticated when a full credential pair is
    /// stored; the cached profile is used when it still parses.
    pub fn restore(&self) {
        let tokens = self.tokens();
        let is_authenticated = match tokens.read() {
            Ok(pair) => pair.is_some(),
            Err(err) => {
                warn!("Failed to read stored credentials: {err}");
                false
            }
        };

        let user = if is_authenticated {
            self.cached_profile()
        } else {
            None
        };

        debug!(is_authenticated, has_profile = user.is_some(), "Restored session");
        self.replace_state(SessionState {
            user,
            is_authenticated,
        });
    }

    /// Current snapshot
    pub fn state(&self) -> SessionState {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state().user
    }

    pub fn role(&self) -> Option<Role> {
        self.state().role()
    }

    /// See [`SessionState::has_role`]
    pub fn has_role(&self, roles: Option<&[Role]>) -> bool {
        self.state().has_role(roles)
    }

    pub fn client(&self) -> &AdminClient {
        &self.inner.client
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.inner.navigator
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.inner.guard
    }

    fn tokens(&self) -> &TokenStore {
        self.inner.client.tokens()
    }

    /// Store a freshly issued credential pair and load the matching profile.
    ///
    /// The session is authenticated as soon as the pair is saved; a failed
    /// profile fetch is returned but does not undo the sign-in.
    pub async fn login(
        &self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Result<Option<UserProfile>, SessionError> {
        let pair = CredentialPair::new(access_token, refresh_token);
        self.tokens().save(&pair)?;

        drop(self.transition(SessionState {
            user: None,
            is_authenticated: true,
        }));
        info!("Session started");

        self.get_profile().await
    }

    /// Validate the form, exchange the credentials and start a session
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserProfile>, SessionError> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        request.validate()?;

        let pair = self
            .inner
            .client
            .login(&request)
            .await
            .map_err(SessionError::SignIn)?;

        self.login(pair.access_token, pair.refresh_token).await
    }

    /// Fetch the signed-in user's profile and cache it.
    ///
    /// Returns `Ok(None)` without a request when signed out, and also when a
    /// logout or a new login happened while the request was in flight. On
    /// failure the session is left as it was, unless the client gave up on
    /// the credentials altogether; then the session ends locally too.
    pub async fn get_profile(&self) -> Result<Option<UserProfile>, SessionError> {
        if !self.is_authenticated() {
            debug!("Not signed in, skipping profile fetch");
            return Ok(None);
        }

        let epoch = self.inner.epoch.load(Ordering::SeqCst);
        let profile = match self.inner.client.me().await {
            Ok(profile) => profile,
            Err(err) => {
                warn!("Failed to fetch profile: {err}");
                if err.is_auth_expired() {
                    self.end_if_credentials_gone(epoch);
                }
                return Err(SessionError::Profile(err));
            }
        };

        // The cache is written under the state lock so a concurrent logout
        // either sees it and removes it, or bumps the epoch first.
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if self.inner.epoch.load(Ordering::SeqCst) != epoch || !state.is_authenticated {
            debug!("Session changed while fetching profile, discarding result");
            return Ok(None);
        }
        state.user = Some(profile.clone());

        match serde_json::to_string(&profile) {
            Ok(json) => {
                if let Err(err) = self.tokens().backend().set(USER_KEY, &json) {
                    warn!("Failed to cache profile: {err}");
                }
            }
            Err(err) => warn!("Failed to serialize profile: {err}"),
        }
        drop(state);

        debug!(user_id = profile.id, role = %profile.role, "Loaded profile");
        Ok(Some(profile))
    }

    /// End the session locally and send the user to the login page.
    ///
    /// Tokens and the cached profile are removed whatever state the session
    /// was in. The current location is passed as the `redirect` target
    /// unless the user is already on the login page.
    pub fn logout(&self) {
        {
            let _state = self.transition(SessionState::default());
            self.clear_storage();
        }
        info!("Session ended");

        let current = self.inner.navigator.current_location();
        let path = current.split(['?', '#']).next().unwrap_or_default();
        let login_path = &self.inner.guard.routes().login_path;
        let target = if path.trim_end_matches('/') == login_path.trim_end_matches('/') {
            login_path.clone()
        } else {
            self.inner.guard.login_url(&current)
        };
        self.inner.navigator.redirect(&target);
    }

    /// Revoke the token on the server, then [`logout`](Self::logout).
    ///
    /// A failed server call is logged and the local logout proceeds.
    pub async fn sign_out(&self) {
        if self.is_authenticated() {
            if let Err(err) = self.inner.client.logout().await {
                warn!("Server logout failed: {err}");
            }
        }
        self.logout();
    }

    fn cached_profile(&self) -> Option<UserProfile> {
        let raw = match self.tokens().backend().get(USER_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!("Failed to read cached profile: {err}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(err) => {
                debug!("Ignoring unreadable cached profile: {err}");
                None
            }
        }
    }

    fn replace_state(&self, next: SessionState) {
        *self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Swap in `next` and bump the epoch; the returned guard keeps other
    /// transitions and profile writes out until it is dropped
    fn transition(&self, next: SessionState) -> RwLockWriteGuard<'_, SessionState> {
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        *state = next;
        state
    }

    fn clear_storage(&self) {
        if let Err(err) = self.tokens().clear() {
            warn!("Failed to clear credentials: {err}");
        }
        if let Err(err) = self.tokens().backend().remove(USER_KEY) {
            warn!("Failed to clear cached profile: {err}");
        }
    }

    /// After a rejected request: if the client dropped the credentials, the
    /// session started under `epoch` is over. Navigation is left to the
    /// client's auth-failure hook.
    fn end_if_credentials_gone(&self, epoch: u64) {
        match self.tokens().read() {
            Ok(None) => {}
            Ok(Some(_)) => return,
            Err(err) => {
                warn!("Failed to read credentials after rejection: {err}");
                return;
            }
        }

        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if self.inner.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        *state = SessionState::default();
        if let Err(err) = self.tokens().backend().remove(USER_KEY) {
            warn!("Failed to clear cached profile: {err}");
        }
        info!("Credentials were revoked, session ended");
    }
}

impl PartialEq for SessionStore {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state())
            .field("epoch", &self.inner.epoch.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
