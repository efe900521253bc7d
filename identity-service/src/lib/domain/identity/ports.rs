use async_trait::async_trait;

use crate::domain::category::models::Category;
use crate::domain::identity::models::AuthenticatedIdentity;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::GoogleProfile;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::models::LoginCommand;
use crate::domain::identity::models::RegisterCommand;
use crate::identity::errors::AuthError;

/// Port for the authentication service.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new identity with a password credential.
    ///
    /// Registering an email that exists as a Google-only account links the
    /// password onto it instead of failing.
    ///
    /// # Errors
    /// * `AlreadyRegistered` - Email already owns a password credential
    /// * `Database` - Persistence failed
    async fn register(&self, command: RegisterCommand)
        -> Result<AuthenticatedIdentity, AuthError>;

    /// Authenticate with email and password.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password
    ///   (indistinguishable by design)
    /// * `FederatedOnly` - Account has no password credential
    /// * `Database` - Persistence failed
    async fn login(&self, command: LoginCommand) -> Result<AuthenticatedIdentity, AuthError>;

    /// Authenticate with a Google ID token, creating or linking the
    /// identity as needed. Re-login of an already-linked account is
    /// idempotent.
    ///
    /// # Errors
    /// * `InvalidGoogleToken` - Verification against Google failed
    /// * `Database` - Persistence failed
    async fn google_login(&self, credential: &str) -> Result<AuthenticatedIdentity, AuthError>;

    /// Resolve the identity behind a validated token subject.
    ///
    /// # Errors
    /// * `Unauthenticated` - Identity no longer exists
    /// * `Database` - Persistence failed
    async fn current_identity(&self, id: &IdentityId) -> Result<Identity, AuthError>;
}

/// Persistence operations for the identity aggregate.
#[async_trait]
pub trait IdentityRepository: Send + Sync + 'static {
    /// Persist a new identity together with its default categories in one
    /// transaction: either both are visible afterwards or neither is.
    ///
    /// The email unique constraint is the authoritative guard against
    /// concurrent registration; a duplicate insert fails here rather than
    /// in any earlier existence check.
    ///
    /// # Errors
    /// * `AlreadyRegistered` - Email unique constraint violated
    /// * `Database` - Database operation failed
    async fn create_with_categories(
        &self,
        identity: Identity,
        categories: Vec<Category>,
    ) -> Result<Identity, AuthError>;

    /// Retrieve identity by identifier.
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, AuthError>;

    /// Retrieve identity by normalized email address.
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Identity>, AuthError>;

    /// Update mutable fields (credentials, name, picture, updated_at) of an
    /// existing identity.
    ///
    /// # Errors
    /// * `Database` - Identity missing or database operation failed
    async fn update(&self, identity: Identity) -> Result<Identity, AuthError>;
}

/// Outbound verification of Google ID tokens.
#[async_trait]
pub trait GoogleVerifier: Send + Sync + 'static {
    /// Verify an ID token against Google's tokeninfo endpoint.
    ///
    /// Infallible by contract: every transport, parsing, audience, or
    /// expiry failure is observed internally and collapses to `None`.
    /// Implementations with no configured client id short-circuit to
    /// `None` without network I/O.
    async fn verify(&self, id_token: &str) -> Option<GoogleProfile>;
}
