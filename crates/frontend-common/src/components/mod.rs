mod require_access;
mod session_provider;

pub use require_access::{RequireAccess, RequireAccessProps};
pub use session_provider::{SessionContext, SessionProvider, SessionProviderProps, use_session};
