use serde::Deserialize;
use serde::Serialize;

/// JWT claims minted for an authenticated identity.
///
/// Every field is mandatory: tokens without a subject, audience, or expiry
/// are not issued by this service and are rejected on validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (identity id as uuid string)
    pub sub: String,

    /// Email claim of the authenticated identity
    pub email: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}
