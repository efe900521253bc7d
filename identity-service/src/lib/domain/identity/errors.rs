use thiserror::Error;

/// Error for IdentityId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for password policy violations at registration
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },
}

/// Error for DisplayName validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("Name must not be empty")]
    Empty,
}

/// Top-level error for all authentication operations.
///
/// Messages on the credential-failure variants are deliberately generic:
/// an unknown email and a wrong password are indistinguishable to the
/// caller. `FederatedOnly` is the one accepted exception, trading strict
/// anti-enumeration for an actionable message.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid password: {0}")]
    InvalidPassword(#[from] PasswordPolicyError),

    #[error("Invalid name: {0}")]
    InvalidName(#[from] NameError),

    #[error("Invalid identity ID: {0}")]
    InvalidIdentityId(#[from] IdentityIdError),

    // Authentication failures
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("This account uses Google sign-in. Please continue with Google.")]
    FederatedOnly,

    #[error("Invalid Google token")]
    InvalidGoogleToken,

    #[error("Not authenticated")]
    Unauthenticated,

    // Conflicts
    #[error("This email is already registered. Please sign in.")]
    AlreadyRegistered,

    // Infrastructure errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<auth::PasswordError> for AuthError {
    fn from(err: auth::PasswordError) -> Self {
        AuthError::Internal(format!("Password hashing failed: {}", err))
    }
}

impl From<auth::TokenError> for AuthError {
    fn from(err: auth::TokenError) -> Self {
        AuthError::Internal(format!("Token generation failed: {}", err))
    }
}
