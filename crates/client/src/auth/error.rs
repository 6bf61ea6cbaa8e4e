//! Login error taxonomy.

use thiserror::Error;

use crate::api::{ApiError, FieldErrors};

/// Why a login attempt failed.
///
/// Login never retries; the caller decides whether to offer "Try Again".
#[derive(Debug, Error)]
pub enum LoginError {
    /// Identifier/password pair rejected.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The form was rejected field by field.
    #[error("invalid login form: {message}")]
    Validation { message: String, fields: FieldErrors },

    /// The backend could not be reached.
    #[error("network error: {0}")]
    Network(#[source] ApiError),

    /// The backend failed or answered with something unusable.
    #[error("server error: {0}")]
    Server(#[source] ApiError),
}

impl LoginError {
    /// Message suitable for the login form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials(message) | Self::Validation { message, .. } => message.clone(),
            Self::Network(_) => {
                "Unable to reach the server. Check your connection and try again.".to_owned()
            }
            Self::Server(_) => "Something went wrong on our side. Please try again.".to_owned(),
        }
    }
}

impl From<ApiError> for LoginError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Unauthorized(message) | ApiError::Forbidden(message) => {
                Self::InvalidCredentials(message)
            }
            ApiError::Validation { message, fields } => Self::Validation { message, fields },
            error @ ApiError::Network(_) => Self::Network(error),
            error => Self::Server(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_invalid_credentials() {
        let error = LoginError::from(ApiError::Unauthorized("Wrong password".to_string()));
        assert!(matches!(error, LoginError::InvalidCredentials(_)));
        assert_eq!(error.user_message(), "Wrong password");
    }

    #[test]
    fn test_server_errors_get_generic_message() {
        let error = LoginError::from(ApiError::Server {
            status: 500,
            message: "stack trace".to_string(),
        });
        assert!(matches!(error, LoginError::Server(_)));
        assert!(!error.user_message().contains("stack trace"));
    }

    #[test]
    fn test_validation_keeps_fields() {
        let mut fields = FieldErrors::new();
        fields.insert("identifier".to_string(), vec!["is required".to_string()]);
        let error = LoginError::from(ApiError::Validation {
            message: "Invalid input".to_string(),
            fields,
        });
        let LoginError::Validation { fields, .. } = error else {
            panic!("expected validation error");
        };
        assert!(fields.contains_key("identifier"));
    }
}
