//! HTTP client for the goftr admin REST API
//!
//! The client attaches the stored access token to every request and, when
//! the API answers 401, exchanges the refresh token for a new pair and
//! retries the request once.

#[cfg(feature = "client")]
pub mod client;

#[cfg(feature = "client")]
pub use client::{AdminClient, AdminClientBuilder, ApiRequest, error::ClientError};
