//! Navigation guard for the admin panel
//!
//! Every navigation is checked in a fixed order:
//!
//! 1. pages outside the public set require a session, otherwise the user is
//!    sent to the login page with the requested path as `redirect`;
//! 2. paths under a restricted prefix require the admin role, otherwise the
//!    user is sent to the not-found page;
//! 3. the password reset page requires a `token` query parameter.

use crate::session::SessionState;
use goftr_admin_core::{Role, RouteConfig};
use tracing::debug;
use url::form_urlencoded;

/// Query parameter carrying the return target on the login URL
pub const REDIRECT_PARAM: &str = "redirect";

/// Query parameter required by the password reset page
pub const RESET_TOKEN_PARAM: &str = "token";

/// A path the user is trying to reach
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    path: String,
    query: String,
}

impl NavigationTarget {
    /// Build from a path and a raw query string (with or without the `?`)
    pub fn new(path: impl Into<String>, query: Option<&str>) -> Self {
        let path = path.into();
        let path = if path.is_empty() { "/".to_string() } else { path };
        let query = query.unwrap_or_default().trim_start_matches('?').to_string();
        Self { path, query }
    }

    /// Parse `/path?query#fragment`; the fragment is dropped
    pub fn parse(location: &str) -> Self {
        let location = location.split('#').next().unwrap_or_default();
        match location.split_once('?') {
            Some((path, query)) => Self::new(path, Some(query)),
            None => Self::new(location, None),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Path plus query, as threaded through the login redirect
    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }

    /// First value of a query parameter
    pub fn query_param(&self, key: &str) -> Option<String> {
        form_urlencoded::parse(self.query.as_bytes())
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
    }
}

/// Why a navigation was redirected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    /// No session on a non-public page
    Unauthenticated,
    /// Non-admin on a restricted page
    Forbidden,
    /// Password reset page opened without a token
    MissingResetToken,
}

/// Outcome of a guard evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect {
        location: String,
        reason: RedirectReason,
    },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Redirect location, if any
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Allow => None,
            Self::Redirect { location, .. } => Some(location),
        }
    }
}

/// Route guard configured with the panel's public and restricted pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    routes: RouteConfig,
}

impl RouteGuard {
    pub fn new(routes: RouteConfig) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &RouteConfig {
        &self.routes
    }

    /// Whether `path` can be visited without a session
    pub fn is_public(&self, path: &str) -> bool {
        let path = normalize(path);
        self.routes
            .public_pages
            .iter()
            .any(|page| normalize(page) == path)
    }

    /// Whether `path` falls under an admin-only prefix.
    ///
    /// Prefixes match whole segments: `/users` covers `/users` and
    /// `/users/5` but not `/usersettings`.
    pub fn is_restricted(&self, path: &str) -> bool {
        let path = normalize(path);
        self.routes.restricted_prefixes.iter().any(|prefix| {
            let prefix = normalize(prefix);
            path == prefix
                || prefix == "/"
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Login URL that returns the user to `return_to` after signing in
    pub fn login_url(&self, return_to: &str) -> String {
        login_url(&self.routes.login_path, return_to)
    }

    /// Decide whether the navigation may proceed
    pub fn evaluate(&self, target: &NavigationTarget, session: &SessionState) -> GuardDecision {
        if !self.is_public(target.path()) && !session.is_authenticated {
            debug!(path = target.path(), "Navigation requires a session");
            return GuardDecision::Redirect {
                location: self.login_url(&target.full_path()),
                reason: RedirectReason::Unauthenticated,
            };
        }

        if self.is_restricted(target.path()) && session.role() != Some(Role::Admin) {
            debug!(path = target.path(), role = ?session.role(), "Navigation requires admin role");
            return GuardDecision::Redirect {
                location: self.routes.not_found_path.clone(),
                reason: RedirectReason::Forbidden,
            };
        }

        if normalize(target.path()) == normalize(&self.routes.reset_password_path)
            && target
                .query_param(RESET_TOKEN_PARAM)
                .is_none_or(|token| token.is_empty())
        {
            debug!("Password reset opened without a token");
            return GuardDecision::Redirect {
                location: self.routes.login_path.clone(),
                reason: RedirectReason::MissingResetToken,
            };
        }

        GuardDecision::Allow
    }
}

/// `login_path?redirect=<return_to>`
pub fn login_url(login_path: &str, return_to: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(REDIRECT_PARAM, return_to)
        .finish();
    format!("{login_path}?{query}")
}

/// Strip a trailing slash so `/users/` and `/users` compare equal
fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}
