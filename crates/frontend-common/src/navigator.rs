//! Navigation side effects
//!
//! The session and the HTTP client never touch `window.location` directly;
//! they go through a [`Navigator`] so the same flow runs in the browser, in
//! the CLI and in tests.

/// Reads the current location and performs full-page redirects
pub trait Navigator: Send + Sync {
    /// Current path including the query string, e.g. `/users?page=2`
    fn current_location(&self) -> String;

    /// Leave the current page for `url`
    fn redirect(&self, url: &str);
}

/// `window.location` backed navigator
#[cfg(feature = "web")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserNavigator;

#[cfg(feature = "web")]
impl Navigator for BrowserNavigator {
    fn current_location(&self) -> String {
        web_sys::window()
            .and_then(|window| {
                let location = window.location();
                let path = location.pathname().ok()?;
                let search = location.search().unwrap_or_default();
                Some(format!("{path}{search}"))
            })
            .unwrap_or_else(|| "/".to_string())
    }

    fn redirect(&self, url: &str) {
        let Some(window) = web_sys::window() else {
            tracing::warn!("No window available, cannot redirect to {url}");
            return;
        };
        if let Err(err) = window.location().set_href(url) {
            tracing::warn!("Failed to redirect to {url}: {err:?}");
        }
    }
}
