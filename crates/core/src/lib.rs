//! Core types and utilities for the goftr admin client

pub mod config;
pub mod error;
pub mod storage;
pub mod tokens;
pub mod types;
pub mod validation;

pub use config::{AdminConfig, ApiConfig, RouteConfig};
pub use error::{CoreError, CoreResult};
pub use storage::{KeyValueStore, MemoryStore};
pub use tokens::TokenStore;
pub use types::{
    ApiEnvelope, ApiErrorBody, ApiErrorEnvelope, CreateUserRequest, CredentialPair,
    ForgotPasswordRequest, LoginRequest, RefreshRequest, RegisterRequest, RegisterResponse,
    ResetPasswordRequest, Role, TokenResponse, UpdateProfileRequest, UpdateUserRequest,
    UserProfile, UserStatus,
};
pub use validation::{Validate, ValidationError, ValidationErrors};
