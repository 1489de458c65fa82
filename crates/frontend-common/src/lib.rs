//! Session store, route guard and browser glue for the goftr admin panel
//!
//! The session and guard logic is plain Rust and runs anywhere; the `web`
//! feature adds `localStorage`, `window.location` and the Yew components.

pub mod guard;
pub mod navigator;
pub mod session;

#[cfg(feature = "web")]
pub mod client;
#[cfg(feature = "web")]
pub mod components;
#[cfg(feature = "web")]
pub mod logging;
#[cfg(feature = "web")]
pub mod storage;

pub use guard::{GuardDecision, NavigationTarget, RedirectReason, RouteGuard};
pub use navigator::Navigator;
pub use session::{SessionError, SessionState, SessionStore};

#[cfg(feature = "web")]
pub use client::create_session;
#[cfg(feature = "web")]
pub use components::{RequireAccess, SessionContext, SessionProvider, use_session};
#[cfg(feature = "web")]
pub use navigator::BrowserNavigator;
#[cfg(feature = "web")]
pub use storage::BrowserStorage;
