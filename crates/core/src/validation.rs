//! Client-side form validation
//!
//! These rules run before a request is sent so obvious mistakes never reach
//! the API. They are not a substitute for server-side validation.

use crate::types::{
    CreateUserRequest, ForgotPasswordRequest, LoginRequest, RegisterRequest,
    ResetPasswordRequest, UpdateProfileRequest, UpdateUserRequest,
};
use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum password length accepted by the forms
pub const MIN_PASSWORD_LENGTH: usize = 8;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r".+@.+\..+").expect("email pattern is valid"));

/// A single failed form rule
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be a valid email address")]
    InvalidEmail { field: &'static str },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("Passwords do not match")]
    PasswordMismatch,
}

impl ValidationError {
    /// Name of the offending form field
    pub fn field(&self) -> &'static str {
        match self {
            Self::Required { field }
            | Self::InvalidEmail { field }
            | Self::TooShort { field, .. } => *field,
            Self::PasswordMismatch => "password_confirmation",
        }
    }
}

/// All failures for one form, in field order
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }
}

/// Form rules
pub mod rules {
    use super::{EMAIL_PATTERN, MIN_PASSWORD_LENGTH, ValidationError};

    /// Value must not be empty or whitespace
    pub fn required(value: &str, field: &'static str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::Required { field });
        }
        Ok(())
    }

    /// Value must look like `something@domain.tld`
    pub fn email(value: &str, field: &'static str) -> Result<(), ValidationError> {
        required(value, field)?;
        if !EMAIL_PATTERN.is_match(value) {
            return Err(ValidationError::InvalidEmail { field });
        }
        Ok(())
    }

    pub fn password(value: &str, field: &'static str) -> Result<(), ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::Required { field });
        }
        if value.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::TooShort {
                field,
                min: MIN_PASSWORD_LENGTH,
            });
        }
        Ok(())
    }

    /// Repeated password must be present and equal the new password
    pub fn password_confirmation(value: &str, new_password: &str) -> Result<(), ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::Required {
                field: "password_confirmation",
            });
        }
        if value != new_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }
}

/// Forms that can be checked before submission
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Collect every failed rule instead of stopping at the first
fn collect(
    results: impl IntoIterator<Item = Result<(), ValidationError>>,
) -> Result<(), ValidationErrors> {
    let errors: Vec<_> = results.into_iter().filter_map(Result::err).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

fn optional_email(value: Option<&String>, field: &'static str) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |email| rules::email(email, field))
}

fn optional_required(value: Option<&String>, field: &'static str) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |v| rules::required(v, field))
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        collect([
            rules::email(&self.email, "email"),
            rules::required(&self.password, "password"),
        ])
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        collect([
            rules::email(&self.email, "email"),
            rules::password(&self.password, "password"),
            rules::required(&self.first_name, "first_name"),
            rules::required(&self.last_name, "last_name"),
        ])
    }
}

impl Validate for ForgotPasswordRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        collect([rules::email(&self.email, "email")])
    }
}

impl Validate for ResetPasswordRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        collect([
            rules::required(&self.token, "token"),
            rules::password(&self.new_password, "new_password"),
        ])
    }
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let password_change = match &self.new_password {
            Some(new_password) => rules::password(new_password, "new_password").and_then(|()| {
                rules::required(
                    self.current_password.as_deref().unwrap_or_default(),
                    "current_password",
                )
            }),
            None => Ok(()),
        };

        collect([
            optional_required(self.first_name.as_ref(), "first_name"),
            optional_required(self.last_name.as_ref(), "last_name"),
            optional_email(self.email.as_ref(), "email"),
            password_change,
        ])
    }
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        collect([
            rules::email(&self.email, "email"),
            rules::required(&self.first_name, "first_name"),
            rules::required(&self.last_name, "last_name"),
            rules::password(&self.password, "password"),
        ])
    }
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        collect([
            optional_email(self.email.as_ref(), "email"),
            optional_required(self.first_name.as_ref(), "first_name"),
            optional_required(self.last_name.as_ref(), "last_name"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        assert!(rules::required("x", "name").is_ok());
        assert_eq!(
            rules::required("   ", "name"),
            Err(ValidationError::Required { field: "name" })
        );
    }

    #[test]
    fn test_email() {
        assert!(rules::email("ada@example.com", "email").is_ok());
        assert_eq!(
            rules::email("ada@example", "email"),
            Err(ValidationError::InvalidEmail { field: "email" })
        );
        assert_eq!(
            rules::email("", "email"),
            Err(ValidationError::Required { field: "email" })
        );
    }

    #[test]
    fn test_password_length() {
        assert!(rules::password("12345678", "password").is_ok());
        assert_eq!(
            rules::password("1234567", "password"),
            Err(ValidationError::TooShort {
                field: "password",
                min: MIN_PASSWORD_LENGTH
            })
        );
    }

    #[test]
    fn test_password_confirmation() {
        assert!(rules::password_confirmation("secret123", "secret123").is_ok());
        assert_eq!(
            rules::password_confirmation("secret124", "secret123"),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            rules::password_confirmation("", "secret123").unwrap_err().field(),
            "password_confirmation"
        );
    }

    #[test]
    fn test_register_collects_all_failures() {
        let request = RegisterRequest {
            email: "nope".into(),
            password: "short".into(),
            first_name: "Ada".into(),
            last_name: String::new(),
        };

        let errors = request.validate().unwrap_err();
        let fields: Vec<_> = errors.errors().iter().map(ValidationError::field).collect();
        assert_eq!(fields, vec!["email", "password", "last_name"]);
        assert!(errors.to_string().starts_with("email must be a valid email address"));
    }

    #[test]
    fn test_partial_updates_only_check_present_fields() {
        assert!(UpdateUserRequest::default().validate().is_ok());

        let request = UpdateProfileRequest {
            email: Some("bad".into()),
            ..Default::default()
        };
        assert_eq!(request.validate().unwrap_err().errors().len(), 1);
    }

    #[test]
    fn test_password_change_needs_current_password() {
        let request = UpdateProfileRequest {
            new_password: Some("new-secret-1".into()),
            ..Default::default()
        };
        assert_eq!(
            request.validate().unwrap_err().errors(),
            &[ValidationError::Required {
                field: "current_password"
            }]
        );

        let request = UpdateProfileRequest {
            new_password: Some("new-secret-1".into()),
            current_password: Some("old-secret".into()),
            ..Default::default()
        };
        assert!(request.validate().is_ok());
    }
}
