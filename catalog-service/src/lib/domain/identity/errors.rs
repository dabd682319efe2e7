use thiserror::Error;

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Username too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Username contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for Role parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unknown role: {0} (expected ADMIN or USER)")]
    Unknown(String),
}

/// Rejection raised by the access control guard.
///
/// Carries no detail about which check failed; the reason is only logged.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Access denied")]
pub struct AccessDenied;

/// Top-level error for all identity operations
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid role: {0}")]
    InvalidRole(#[from] RoleError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Password error: {0}")]
    Password(#[from] auth::PasswordError),

    // Domain-level errors
    #[error("Username already exists: {0}")]
    DuplicateUser(String),

    #[error("Email already exists: {0}")]
    DuplicateEmail(String),

    #[error("Invalid username/email or password")]
    InvalidCredentials,

    #[error("No user matches identifier: {0}")]
    PrincipalNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Token is expired")]
    TokenExpired,

    #[error("Token is invalid: {0}")]
    TokenInvalid(String),

    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),

    // Infrastructure errors
    #[error("Token signing failed: {0}")]
    TokenSigning(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<auth::JwtError> for IdentityError {
    fn from(err: auth::JwtError) -> Self {
        match err {
            auth::JwtError::TokenExpired => IdentityError::TokenExpired,
            auth::JwtError::InvalidToken(msg) => IdentityError::TokenInvalid(msg),
            auth::JwtError::EncodingFailed(msg) => IdentityError::TokenSigning(msg),
            auth::JwtError::WeakSecret { .. } => IdentityError::TokenSigning(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for IdentityError {
    fn from(err: anyhow::Error) -> Self {
        IdentityError::Unknown(err.to_string())
    }
}
