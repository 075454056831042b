//! Authentication and authorization error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the authentication and user-management core
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthError {
    /// Invalid credentials provided. Deliberately identical for an
    /// unknown username and a wrong password so callers cannot
    /// enumerate accounts.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Token signature does not verify or the token cannot be parsed
    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    /// Token expiry has elapsed
    #[error("Token has expired")]
    ExpiredToken,

    /// Token carries the wrong embedded type (refresh where access is
    /// required, or vice versa)
    #[error("Token type mismatch: expected {expected}, found {found}")]
    TokenTypeMismatch { expected: String, found: String },

    /// No token was submitted where one is required
    #[error("Authentication token missing")]
    MissingToken,

    /// Authorization failure
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// Target record does not exist
    #[error("User not found")]
    NotFound,

    /// Uniqueness violation on the named field
    #[error("Conflict: {field} already exists")]
    Conflict { field: String },

    /// Operation would leave the system without an enabled admin
    #[error("Cannot remove the last enabled admin")]
    LastAdminProtected,

    /// Malformed input
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    /// Configuration errors (fatal, established at startup)
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Cryptographic errors. Hashing failures are fatal process
    /// errors, never per-request conditions.
    #[error("Cryptographic error: {message}")]
    CryptographicError { message: String },

    /// Store errors
    #[error("Database error: {message}")]
    DatabaseError { message: String },
}

impl AuthError {
    /// Get the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::InvalidToken { .. } => "INVALID_TOKEN",
            AuthError::ExpiredToken => "EXPIRED_TOKEN",
            AuthError::TokenTypeMismatch { .. } => "TOKEN_TYPE_MISMATCH",
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::Forbidden { .. } => "FORBIDDEN",
            AuthError::NotFound => "NOT_FOUND",
            AuthError::Conflict { .. } => "CONFLICT",
            AuthError::LastAdminProtected => "LAST_ADMIN_PROTECTED",
            AuthError::ValidationError { .. } => "VALIDATION_ERROR",
            AuthError::ConfigurationError { .. } => "CONFIGURATION_ERROR",
            AuthError::CryptographicError { .. } => "CRYPTOGRAPHIC_ERROR",
            AuthError::DatabaseError { .. } => "DATABASE_ERROR",
        }
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidCredentials => 401,
            AuthError::InvalidToken { .. } => 401,
            AuthError::ExpiredToken => 401,
            AuthError::TokenTypeMismatch { .. } => 401,
            AuthError::MissingToken => 401,
            AuthError::Forbidden { .. } => 403,
            AuthError::NotFound => 404,
            AuthError::Conflict { .. } => 409,
            AuthError::LastAdminProtected => 409,
            AuthError::ValidationError { .. } => 422,
            AuthError::ConfigurationError { .. } => 500,
            AuthError::CryptographicError { .. } => 500,
            AuthError::DatabaseError { .. } => 500,
        }
    }

    /// Create an invalid token error
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Create a token type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TokenTypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create a conflict error for the named unique field
    pub fn conflict(field: impl Into<String>) -> Self {
        Self::Conflict {
            field: field.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create a cryptographic error
    pub fn crypto_error(message: impl Into<String>) -> Self {
        Self::CryptographicError {
            message: message.into(),
        }
    }

    /// Create a database error
    pub fn database_error(message: impl Into<String>) -> Self {
        Self::DatabaseError {
            message: message.into(),
        }
    }
}

// Conversion from common error types
impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::ExpiredToken,
            _ => Self::invalid_token(err.to_string()),
        }
    }
}

#[cfg(feature = "argon2")]
impl From<argon2::Error> for AuthError {
    fn from(err: argon2::Error) -> Self {
        Self::crypto_error(err.to_string())
    }
}

#[cfg(feature = "bcrypt")]
impl From<bcrypt::BcryptError> for AuthError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::crypto_error(err.to_string())
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                // Constraint names carry the column: users_username_key etc.
                let constraint = db.constraint().unwrap_or_default();
                if constraint.contains("email") {
                    Self::conflict("email")
                } else if constraint.contains("username") {
                    Self::conflict("username")
                } else {
                    Self::conflict("record")
                }
            }
            _ => Self::database_error(err.to_string()),
        }
    }
}
