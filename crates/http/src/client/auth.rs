//! Authentication API client methods

use super::{AdminClient, ApiRequest, ClientError};
use goftr_admin_core::{
    CredentialPair, ForgotPasswordRequest, LoginRequest, RefreshRequest, RegisterRequest,
    RegisterResponse, ResetPasswordRequest, TokenResponse,
};

impl AdminClient {
    /// Create a new account
    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<RegisterResponse, ClientError> {
        let req = ApiRequest::post("/auth/register").json(request)?.public();
        self.send(req).await
    }

    /// Exchange email and password for a credential pair.
    ///
    /// The pair is returned, not stored; persisting it is the session's job.
    pub async fn login(&self, request: &LoginRequest) -> Result<CredentialPair, ClientError> {
        let req = ApiRequest::post("/auth/login").json(request)?.public();
        let tokens: TokenResponse = self.send(req).await?;
        Ok(tokens.into())
    }

    /// Revoke the current access token on the server
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.send_unit(ApiRequest::post("/auth/logout")).await
    }

    /// Request a password reset email.
    ///
    /// Development servers echo the reset token back in `data`.
    pub async fn forgot_password(
        &self,
        request: &ForgotPasswordRequest,
    ) -> Result<serde_json::Value, ClientError> {
        let req = ApiRequest::post("/auth/forgot-password")
            .json(request)?
            .public();
        self.send(req).await
    }

    /// Set a new password using a reset token
    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<(), ClientError> {
        let req = ApiRequest::post("/auth/reset-password")
            .json(request)?
            .public();
        self.send_unit(req).await
    }

    /// Exchange a refresh token for a new credential pair.
    ///
    /// Dispatched directly rather than through [`AdminClient::execute`],
    /// which itself calls this on a 401.
    pub async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, ClientError> {
        let req = ApiRequest::post("/auth/refresh")
            .json(&RefreshRequest {
                refresh_token: refresh_token.to_string(),
            })?
            .public();
        let response = self.dispatch(&req, None).await?;
        let tokens: TokenResponse = Self::decode(response).await?;
        Ok(tokens.into())
    }
}
