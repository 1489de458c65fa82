//! Terminal stand-in for browser navigation

use goftr_admin_frontend_common::Navigator;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Tracks a notional current page; redirects move it and are logged
#[derive(Debug)]
pub struct TerminalNavigator {
    current: Mutex<String>,
}

impl TerminalNavigator {
    pub fn new(current: impl Into<String>) -> Self {
        Self {
            current: Mutex::new(current.into()),
        }
    }
}

impl Navigator for TerminalNavigator {
    fn current_location(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn redirect(&self, url: &str) {
        info!("Redirect to {url}");
        *self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = url.to_string();
    }
}
