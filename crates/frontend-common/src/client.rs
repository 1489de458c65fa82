//! Browser session wiring

use crate::guard::RouteGuard;
use crate::navigator::{BrowserNavigator, Navigator};
use crate::session::SessionStore;
use crate::storage::BrowserStorage;
use goftr_admin_core::{AdminConfig, TokenStore};
use goftr_admin_http::{AdminClient, ClientError};
use std::sync::Arc;

/// Build the panel's session: `localStorage` tokens, `window.location`
/// navigation, and a client that sends the user to the login page when the
/// session cannot be refreshed.
pub fn create_session(config: &AdminConfig) -> Result<SessionStore, ClientError> {
    let tokens = TokenStore::new(Arc::new(BrowserStorage));
    let login_path = config.routes.login_path.clone();

    let client = AdminClient::builder()
        .base_url(&config.api.base_url)
        .token_store(tokens)
        .on_auth_failure(move || BrowserNavigator.redirect(&login_path))
        .build()?;

    Ok(SessionStore::new(
        client,
        Arc::new(BrowserNavigator),
        RouteGuard::new(config.routes.clone()),
    ))
}
