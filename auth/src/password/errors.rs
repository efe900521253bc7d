use thiserror::Error;

/// Error type for password hashing.
///
/// Verification is infallible by contract (any malformed input verifies as
/// false), so only the hashing side carries an error.
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}
