//! User API client methods

use super::{AdminClient, ApiRequest, ClientError};
use goftr_admin_core::{CreateUserRequest, UpdateProfileRequest, UpdateUserRequest, UserProfile};

impl AdminClient {
    /// Get the signed-in user's profile
    pub async fn me(&self) -> Result<UserProfile, ClientError> {
        self.send(ApiRequest::get("/users/me")).await
    }

    /// Update the signed-in user's profile
    pub async fn update_me(&self, request: &UpdateProfileRequest) -> Result<(), ClientError> {
        self.send_unit(ApiRequest::put("/users/me").json(request)?).await
    }

    /// List all users (admin only)
    pub async fn list_users(&self) -> Result<Vec<UserProfile>, ClientError> {
        self.send(ApiRequest::get("/users")).await
    }

    /// Create a user (admin only)
    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<(), ClientError> {
        self.send_unit(ApiRequest::post("/users").json(request)?).await
    }

    /// Get a user by id (admin only)
    pub async fn get_user(&self, id: i64) -> Result<UserProfile, ClientError> {
        self.send(ApiRequest::get(format!("/users/{id}"))).await
    }

    /// Update a user (admin only)
    pub async fn update_user(
        &self,
        id: i64,
        request: &UpdateUserRequest,
    ) -> Result<(), ClientError> {
        self.send_unit(ApiRequest::put(format!("/users/{id}")).json(request)?).await
    }

    /// Delete a user (admin only)
    pub async fn delete_user(&self, id: i64) -> Result<(), ClientError> {
        self.send_unit(ApiRequest::delete(format!("/users/{id}"))).await
    }
}
