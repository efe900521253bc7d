use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::identity::errors::EmailError;
use crate::identity::errors::IdentityIdError;
use crate::identity::errors::NameError;
use crate::identity::errors::PasswordPolicyError;

/// Identity aggregate entity.
///
/// Represents one account, keyed by unique id and unique normalized email.
/// Credential presence is a tagged state so the linking transitions are
/// exhaustively matched, never two independently-nullable fields.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: IdentityId,
    pub email: EmailAddress,
    pub name: Option<DisplayName>,
    pub picture_url: Option<String>,
    pub credentials: Credentials,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Identity unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityId(pub Uuid);

impl IdentityId {
    /// Generate a new random identity ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identity ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, IdentityIdError> {
        Uuid::parse_str(s)
            .map(IdentityId)
            .map_err(|e| IdentityIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Normalizes to lowercase before validating, so lookups compare
/// case-insensitively by construction. Validates with an RFC 5322 parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated, normalized email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: impl Into<String>) -> Result<Self, EmailError> {
        let email = email.into().trim().to_lowercase();
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password accepted at registration.
///
/// Enforces the minimum-length policy; hashing happens in the service.
#[derive(Debug, Clone)]
pub struct Password(String);

impl Password {
    const MIN_LENGTH: usize = 8;

    /// Create a policy-checked registration password.
    ///
    /// # Errors
    /// * `TooShort` - Fewer than 8 characters
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }
        Ok(Self(password))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Display name type, non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    /// Create a validated display name.
    ///
    /// # Errors
    /// * `Empty` - Name is empty or whitespace-only
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Credential state of an identity.
///
/// An identity always holds at least one credential. Linking only ever adds
/// the missing kind; a credential is never removed by this subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Password-only account
    Password { hash: String },

    /// Google-only account
    Federated { google_id: String },

    /// Linked account with both credential kinds
    Both { hash: String, google_id: String },
}

impl Credentials {
    /// Reconstruct from storage columns.
    ///
    /// # Returns
    /// None when both columns are null (unusable row)
    pub fn from_parts(hash: Option<String>, google_id: Option<String>) -> Option<Self> {
        match (hash, google_id) {
            (Some(hash), None) => Some(Credentials::Password { hash }),
            (None, Some(google_id)) => Some(Credentials::Federated { google_id }),
            (Some(hash), Some(google_id)) => Some(Credentials::Both { hash, google_id }),
            (None, None) => None,
        }
    }

    pub fn password_hash(&self) -> Option<&str> {
        match self {
            Credentials::Password { hash } | Credentials::Both { hash, .. } => Some(hash),
            Credentials::Federated { .. } => None,
        }
    }

    pub fn google_id(&self) -> Option<&str> {
        match self {
            Credentials::Federated { google_id } | Credentials::Both { google_id, .. } => {
                Some(google_id)
            }
            Credentials::Password { .. } => None,
        }
    }

    pub fn has_password(&self) -> bool {
        self.password_hash().is_some()
    }

    pub fn has_google(&self) -> bool {
        self.google_id().is_some()
    }

    /// Add a password credential, keeping any existing Google link.
    pub fn with_password(self, hash: String) -> Self {
        match self {
            Credentials::Password { .. } => Credentials::Password { hash },
            Credentials::Federated { google_id } | Credentials::Both { google_id, .. } => {
                Credentials::Both { hash, google_id }
            }
        }
    }

    /// Add a Google credential, keeping any existing password.
    pub fn with_google(self, google_id: String) -> Self {
        match self {
            Credentials::Federated { .. } => Credentials::Federated { google_id },
            Credentials::Password { hash } | Credentials::Both { hash, .. } => {
                Credentials::Both { hash, google_id }
            }
        }
    }
}

/// Profile returned by Google's tokeninfo endpoint after a successful
/// verification. Raw strings: the service re-validates the email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleProfile {
    pub google_id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture_url: Option<String>,
}

/// Command to register a new identity with domain types
#[derive(Debug)]
pub struct RegisterCommand {
    pub email: EmailAddress,
    pub password: Password,
    pub name: DisplayName,
}

impl RegisterCommand {
    pub fn new(email: EmailAddress, password: Password, name: DisplayName) -> Self {
        Self {
            email,
            password,
            name,
        }
    }
}

/// Command to sign in with email and password.
///
/// The password is not policy-checked here: any mismatch (including a
/// too-short input) surfaces as the generic credential failure.
#[derive(Debug)]
pub struct LoginCommand {
    pub email: EmailAddress,
    pub password: String,
}

impl LoginCommand {
    pub fn new(email: EmailAddress, password: String) -> Self {
        Self { email, password }
    }
}

/// Result of a successful authentication: the minted token plus the
/// identity it belongs to. The password hash never leaves the service
/// boundary (the HTTP layer maps this to a summary).
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    pub token: String,
    pub identity: Identity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalizes_case() {
        let email = EmailAddress::new("Alice@Example.COM").unwrap();
        assert_eq!(email.as_str(), "alice@example.com");
    }

    #[test]
    fn test_email_rejects_invalid() {
        assert!(EmailAddress::new("not-an-email").is_err());
        assert!(EmailAddress::new("").is_err());
    }

    #[test]
    fn test_password_minimum_length() {
        assert!(Password::new("short".to_string()).is_err());
        assert!(Password::new("longenough1".to_string()).is_ok());

        let err = Password::new("1234567".to_string()).unwrap_err();
        assert_eq!(err, PasswordPolicyError::TooShort { min: 8, actual: 7 });
    }

    #[test]
    fn test_display_name_rejects_blank() {
        assert!(DisplayName::new("").is_err());
        assert!(DisplayName::new("   ").is_err());
        assert_eq!(DisplayName::new("  Alice ").unwrap().as_str(), "Alice");
    }

    #[test]
    fn test_credentials_from_parts() {
        assert_eq!(Credentials::from_parts(None, None), None);
        assert_eq!(
            Credentials::from_parts(Some("h".into()), None),
            Some(Credentials::Password { hash: "h".into() })
        );
        assert_eq!(
            Credentials::from_parts(None, Some("g".into())),
            Some(Credentials::Federated {
                google_id: "g".into()
            })
        );
        assert_eq!(
            Credentials::from_parts(Some("h".into()), Some("g".into())),
            Some(Credentials::Both {
                hash: "h".into(),
                google_id: "g".into()
            })
        );
    }

    #[test]
    fn test_credentials_linking_transitions() {
        let federated = Credentials::Federated {
            google_id: "g".into(),
        };
        let linked = federated.with_password("h".into());
        assert_eq!(
            linked,
            Credentials::Both {
                hash: "h".into(),
                google_id: "g".into()
            }
        );

        let password_only = Credentials::Password { hash: "h".into() };
        let linked = password_only.with_google("g".into());
        assert_eq!(
            linked,
            Credentials::Both {
                hash: "h".into(),
                google_id: "g".into()
            }
        );

        // Linking never drops the existing credential
        assert!(linked.has_password());
        assert!(linked.has_google());
    }
}
