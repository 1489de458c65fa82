//! goftr admin API client

pub mod auth;
pub mod error;
pub mod users;

use error::ClientError;
use goftr_admin_core::{ApiEnvelope, MemoryStore, TokenStore};
use reqwest::{Client, ClientBuilder, Method, Response, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Callback fired after credentials were cleared because a session could not
/// be recovered. The browser build redirects to the login page from here.
pub type AuthFailureHook = Arc<dyn Fn() + Send + Sync>;

const USER_AGENT: &str = concat!("goftr-admin/", env!("CARGO_PKG_VERSION"));

/// Description of one API call.
///
/// Requests are kept as data rather than `reqwest::RequestBuilder` so the
/// same call can be re-issued with a fresh token after a refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    public: bool,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            public: false,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Send without credentials and without refresh-on-401.
    ///
    /// Used for the sign-in style endpoints, where a 401 means bad
    /// credentials rather than an expired session.
    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    /// Whether this request already went through a refresh-and-retry
    pub fn is_retried(&self) -> bool {
        self.retried
    }
}

/// goftr admin API client
///
/// Cheap to clone; clones share the HTTP connection pool, the token store and
/// the refresh lock.
#[derive(Clone)]
pub struct AdminClient {
    client: Client,
    base_url: String,
    tokens: TokenStore,
    refresh_lock: Arc<Mutex<()>>,
    on_auth_failure: Option<AuthFailureHook>,
}

impl AdminClient {
    /// Create a new client with default configuration and in-memory tokens
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> AdminClientBuilder {
        AdminClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token store backing this client
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Send a request and unwrap the `data` member of the response envelope
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    /// Unwrap the `data` member of a success envelope
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let body = response.bytes().await?;
        let envelope: ApiEnvelope<T> = serde_json::from_slice(&body)?;
        Ok(envelope.data)
    }

    /// Send a request whose response carries nothing the caller needs
    pub async fn send_unit(&self, request: ApiRequest) -> Result<(), ClientError> {
        self.execute(request).await?;
        Ok(())
    }

    /// Send a request, recovering once from an expired access token.
    ///
    /// On a 401 for a non-public request that has not been retried yet, the
    /// refresh token is exchanged for a new pair and the request is sent
    /// again. If the refresh is impossible or fails, the stored credentials
    /// are cleared, the auth-failure hook fires and the original 401 is
    /// returned. A 401 on the retried request is returned as is.
    pub async fn execute(&self, mut request: ApiRequest) -> Result<Response, ClientError> {
        loop {
            let sent_with = if request.public {
                None
            } else {
                self.tokens.access_token()?
            };

            match self.dispatch(&request, sent_with.as_deref()).await {
                Err(err) if err.is_auth_expired() && !request.public && !request.retried => {
                    request.retried = true;
                    debug!(
                        method = %request.method,
                        path = %request.path,
                        "Access token rejected, attempting refresh"
                    );

                    if let Err(refresh_err) = self.refresh_after(sent_with.as_deref()).await {
                        warn!("Session could not be refreshed: {refresh_err}");
                        self.fail_session();
                        return Err(err);
                    }
                }
                result => return result,
            }
        }
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<Response, ClientError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.clone(), url);

        if let Some(token) = access_token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!(method = %request.method, path = %request.path, status = status.as_u16(), "API response");

        if status.is_success() {
            Ok(response)
        } else {
            Err(ClientError::from_response(response).await)
        }
    }

    /// Obtain a fresh access token after `stale` was rejected.
    ///
    /// Refreshes are single-flight: concurrent callers queue on the refresh
    /// lock, and a caller that finds the stored token already rotated by an
    /// earlier holder reuses it instead of refreshing again.
    async fn refresh_after(&self, stale: Option<&str>) -> Result<String, ClientError> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.tokens.access_token()? {
            if stale != Some(current.as_str()) {
                debug!("Access token already rotated by a concurrent refresh");
                return Ok(current);
            }
        }

        let refresh_token = self
            .tokens
            .refresh_token()?
            .ok_or(ClientError::MissingRefreshToken)?;

        let pair = self.refresh(&refresh_token).await?;
        self.tokens.save(&pair)?;
        info!("Refreshed access token");
        Ok(pair.access_token)
    }

    fn fail_session(&self) {
        if let Err(err) = self.tokens.clear() {
            warn!("Failed to clear credentials: {err}");
        }
        if let Some(hook) = &self.on_auth_failure {
            hook();
        }
    }
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Builder for AdminClient
#[derive(Default)]
pub struct AdminClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    tokens: Option<TokenStore>,
    on_auth_failure: Option<AuthFailureHook>,
}

impl AdminClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Use the given token store instead of an in-memory one
    pub fn token_store(mut self, tokens: TokenStore) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Register the callback fired when a session cannot be recovered
    pub fn on_auth_failure(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_auth_failure = Some(Arc::new(hook));
        self
    }

    /// Build the client
    pub fn build(self) -> Result<AdminClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder =
            client_builder.user_agent(self.user_agent.unwrap_or_else(|| USER_AGENT.to_string()));

        let client = client_builder.build()?;
        let tokens = self
            .tokens
            .unwrap_or_else(|| TokenStore::new(Arc::new(MemoryStore::new())));

        Ok(AdminClient {
            client,
            base_url,
            tokens,
            refresh_lock: Arc::new(Mutex::new(())),
            on_auth_failure: self.on_auth_failure,
        })
    }
}
