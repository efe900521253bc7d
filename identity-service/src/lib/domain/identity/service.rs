use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use auth::TokenIssuer;
use chrono::Utc;

use crate::domain::category::models::Category;
use crate::domain::identity::models::AuthenticatedIdentity;
use crate::domain::identity::models::Credentials;
use crate::domain::identity::models::DisplayName;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::models::LoginCommand;
use crate::domain::identity::models::RegisterCommand;
use crate::identity::errors::AuthError;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::GoogleVerifier;
use crate::identity::ports::IdentityRepository;

/// Authentication orchestrator.
///
/// Composes the credential hasher, token issuer, Google verifier, and
/// identity store into the register / login / federated-login flows,
/// including account linking between the two credential kinds.
pub struct AuthService<IR, GV>
where
    IR: IdentityRepository,
    GV: GoogleVerifier,
{
    repository: Arc<IR>,
    google_verifier: Arc<GV>,
    token_issuer: Arc<TokenIssuer>,
    password_hasher: PasswordHasher,
}

impl<IR, GV> AuthService<IR, GV>
where
    IR: IdentityRepository,
    GV: GoogleVerifier,
{
    /// Create a new authentication service with injected dependencies.
    pub fn new(repository: Arc<IR>, google_verifier: Arc<GV>, token_issuer: Arc<TokenIssuer>) -> Self {
        Self {
            repository,
            google_verifier,
            token_issuer,
            password_hasher: PasswordHasher::new(),
        }
    }

    fn issue_for(&self, identity: Identity) -> Result<AuthenticatedIdentity, AuthError> {
        let token = self
            .token_issuer
            .issue(&identity.id.to_string(), identity.email.as_str())?;
        Ok(AuthenticatedIdentity { token, identity })
    }
}

#[async_trait]
impl<IR, GV> AuthServicePort for AuthService<IR, GV>
where
    IR: IdentityRepository,
    GV: GoogleVerifier,
{
    async fn register(
        &self,
        command: RegisterCommand,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let existing = self.repository.find_by_email(&command.email).await?;

        match existing {
            Some(identity) if identity.credentials.has_password() => {
                Err(AuthError::AlreadyRegistered)
            }
            Some(mut identity) => {
                // Google-only account registering a password: link it
                let hash = self.password_hasher.hash(command.password.as_str())?;
                identity.credentials = identity.credentials.with_password(hash);
                identity.name = Some(command.name);
                identity.updated_at = Some(Utc::now());

                let identity = self.repository.update(identity).await?;

                tracing::info!(identity_id = %identity.id, "Password linked to Google account");
                self.issue_for(identity)
            }
            None => {
                let hash = self.password_hasher.hash(command.password.as_str())?;
                let identity = Identity {
                    id: IdentityId::new(),
                    email: command.email,
                    name: Some(command.name),
                    picture_url: None,
                    credentials: Credentials::Password { hash },
                    created_at: Utc::now(),
                    updated_at: None,
                };

                // The unique constraint decides concurrent registrations of
                // the same email; a violation surfaces as AlreadyRegistered.
                let categories = Category::defaults_for(identity.id);
                let identity = self
                    .repository
                    .create_with_categories(identity, categories)
                    .await?;

                tracing::info!(identity_id = %identity.id, "Identity registered");
                self.issue_for(identity)
            }
        }
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthenticatedIdentity, AuthError> {
        let identity = self
            .repository
            .find_by_email(&command.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let Some(hash) = identity.credentials.password_hash() else {
            return Err(AuthError::FederatedOnly);
        };

        if !self.password_hasher.verify(&command.password, hash) {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_for(identity)
    }

    async fn google_login(&self, credential: &str) -> Result<AuthenticatedIdentity, AuthError> {
        let profile = self
            .google_verifier
            .verify(credential)
            .await
            .ok_or(AuthError::InvalidGoogleToken)?;

        let email =
            EmailAddress::new(profile.email).map_err(|_| AuthError::InvalidGoogleToken)?;
        let name = profile
            .name
            .and_then(|name| DisplayName::new(name).ok());

        let existing = self.repository.find_by_email(&email).await?;

        match existing {
            None => {
                let identity = Identity {
                    id: IdentityId::new(),
                    email,
                    name,
                    picture_url: profile.picture_url,
                    credentials: Credentials::Federated {
                        google_id: profile.google_id,
                    },
                    created_at: Utc::now(),
                    updated_at: None,
                };

                let categories = Category::defaults_for(identity.id);
                let identity = self
                    .repository
                    .create_with_categories(identity, categories)
                    .await?;

                tracing::info!(identity_id = %identity.id, "Identity created from Google sign-in");
                self.issue_for(identity)
            }
            Some(identity) if identity.credentials.has_google() => {
                // Already linked: idempotent re-login, no write
                self.issue_for(identity)
            }
            Some(mut identity) => {
                identity.credentials = identity.credentials.with_google(profile.google_id);
                identity.name = name.or(identity.name);
                identity.picture_url = profile.picture_url.or(identity.picture_url);
                identity.updated_at = Some(Utc::now());

                let identity = self.repository.update(identity).await?;

                tracing::info!(identity_id = %identity.id, "Google account linked to identity");
                self.issue_for(identity)
            }
        }
    }

    async fn current_identity(&self, id: &IdentityId) -> Result<Identity, AuthError> {
        // A valid token whose subject no longer exists is unauthenticated,
        // not an internal error: the record may have been removed out-of-band.
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(AuthError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use auth::TokenConfig;
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::domain::identity::models::GoogleProfile;
    use crate::domain::identity::models::Password;

    mock! {
        pub TestIdentityRepository {}

        #[async_trait]
        impl IdentityRepository for TestIdentityRepository {
            async fn create_with_categories(
                &self,
                identity: Identity,
                categories: Vec<Category>,
            ) -> Result<Identity, AuthError>;
            async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, AuthError>;
            async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Identity>, AuthError>;
            async fn update(&self, identity: Identity) -> Result<Identity, AuthError>;
        }
    }

    mock! {
        pub TestGoogleVerifier {}

        #[async_trait]
        impl GoogleVerifier for TestGoogleVerifier {
            async fn verify(&self, id_token: &str) -> Option<GoogleProfile>;
        }
    }

    fn token_issuer() -> Arc<TokenIssuer> {
        Arc::new(TokenIssuer::new(TokenConfig {
            secret: "test-secret-key-for-jwt-signing-at-least-32-bytes".to_string(),
            issuer: "budgeting-be".to_string(),
            audience: "budgeting-fe".to_string(),
            lifetime_minutes: 60,
        }))
    }

    fn service(
        repository: MockTestIdentityRepository,
        verifier: MockTestGoogleVerifier,
    ) -> AuthService<MockTestIdentityRepository, MockTestGoogleVerifier> {
        AuthService::new(Arc::new(repository), Arc::new(verifier), token_issuer())
    }

    fn register_command(email: &str, password: &str, name: &str) -> RegisterCommand {
        RegisterCommand::new(
            EmailAddress::new(email).unwrap(),
            Password::new(password.to_string()).unwrap(),
            DisplayName::new(name).unwrap(),
        )
    }

    fn password_identity(email: &str, hash: String) -> Identity {
        Identity {
            id: IdentityId::new(),
            email: EmailAddress::new(email).unwrap(),
            name: Some(DisplayName::new("Existing").unwrap()),
            picture_url: None,
            credentials: Credentials::Password { hash },
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn google_identity(email: &str, google_id: &str) -> Identity {
        Identity {
            id: IdentityId::new(),
            email: EmailAddress::new(email).unwrap(),
            name: Some(DisplayName::new("Fed User").unwrap()),
            picture_url: Some("https://example.com/p.png".to_string()),
            credentials: Credentials::Federated {
                google_id: google_id.to_string(),
            },
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn profile(email: &str, google_id: &str) -> GoogleProfile {
        GoogleProfile {
            google_id: google_id.to_string(),
            email: email.to_string(),
            name: Some("Fed User".to_string()),
            picture_url: Some("https://example.com/p.png".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_new_identity() {
        let mut repository = MockTestIdentityRepository::new();
        let verifier = MockTestGoogleVerifier::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));

        repository
            .expect_create_with_categories()
            .withf(|identity, categories| {
                identity.email.as_str() == "new@x.com"
                    && identity.credentials.password_hash().is_some()
                    && identity
                        .credentials
                        .password_hash()
                        .unwrap()
                        .starts_with("$argon2")
                    && !identity.credentials.has_google()
                    && categories.len() == 11
            })
            .times(1)
            .returning(|identity, _| Ok(identity));

        let service = service(repository, verifier);

        let result = service
            .register(register_command("New@X.com", "longpassword1", "A"))
            .await
            .expect("Registration failed");

        assert!(!result.token.is_empty());
        assert_eq!(result.identity.email.as_str(), "new@x.com");
    }

    #[tokio::test]
    async fn test_register_existing_password_account_conflicts() {
        let mut repository = MockTestIdentityRepository::new();
        let verifier = MockTestGoogleVerifier::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(password_identity("new@x.com", "$argon2id$h".into()))));

        repository.expect_create_with_categories().times(0);
        repository.expect_update().times(0);

        let service = service(repository, verifier);

        let result = service
            .register(register_command("new@x.com", "longpassword1", "A"))
            .await;

        assert!(matches!(result, Err(AuthError::AlreadyRegistered)));
    }

    #[tokio::test]
    async fn test_register_links_password_onto_google_account() {
        let mut repository = MockTestIdentityRepository::new();
        let verifier = MockTestGoogleVerifier::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(google_identity("fed@x.com", "google-sub-1"))));

        repository
            .expect_update()
            .withf(|identity| {
                // Linking adds the hash and keeps the Google reference
                identity.credentials.has_password()
                    && identity.credentials.google_id() == Some("google-sub-1")
                    && identity.updated_at.is_some()
            })
            .times(1)
            .returning(|identity| Ok(identity));

        let service = service(repository, verifier);

        let result = service
            .register(register_command("fed@x.com", "longpassword1", "Name"))
            .await
            .expect("Linking registration failed");

        assert!(matches!(
            result.identity.credentials,
            Credentials::Both { .. }
        ));
    }

    #[tokio::test]
    async fn test_register_race_maps_unique_violation_to_conflict() {
        let mut repository = MockTestIdentityRepository::new();
        let verifier = MockTestGoogleVerifier::new();

        // Both racing requests pass the lookup before either writes
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));

        repository
            .expect_create_with_categories()
            .times(1)
            .returning(|_, _| Err(AuthError::AlreadyRegistered));

        let service = service(repository, verifier);

        let result = service
            .register(register_command("race@x.com", "longpassword1", "A"))
            .await;

        assert!(matches!(result, Err(AuthError::AlreadyRegistered)));
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut repository = MockTestIdentityRepository::new();
        let verifier = MockTestGoogleVerifier::new();

        let hash = PasswordHasher::new().hash("longpassword1").unwrap();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(password_identity("user@x.com", hash.clone()))));

        let service = service(repository, verifier);

        let result = service
            .login(LoginCommand::new(
                EmailAddress::new("user@x.com").unwrap(),
                "longpassword1".to_string(),
            ))
            .await
            .expect("Login failed");

        assert!(!result.token.is_empty());
    }

    #[tokio::test]
    async fn test_login_rejections_are_indistinguishable() {
        // Unknown email
        let mut repository = MockTestIdentityRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        let service_unknown = service(repository, MockTestGoogleVerifier::new());

        let unknown = service_unknown
            .login(LoginCommand::new(
                EmailAddress::new("nobody@x.com").unwrap(),
                "whatever123".to_string(),
            ))
            .await
            .unwrap_err();

        // Known email, wrong password
        let mut repository = MockTestIdentityRepository::new();
        let hash = PasswordHasher::new().hash("rightpassword").unwrap();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(password_identity("user@x.com", hash.clone()))));
        let service_wrong = service(repository, MockTestGoogleVerifier::new());

        let wrong = service_wrong
            .login(LoginCommand::new(
                EmailAddress::new("user@x.com").unwrap(),
                "wrongpassword".to_string(),
            ))
            .await
            .unwrap_err();

        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_login_federated_only_account() {
        let mut repository = MockTestIdentityRepository::new();
        let verifier = MockTestGoogleVerifier::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(google_identity("fed@x.com", "google-sub-1"))));

        let service = service(repository, verifier);

        let result = service
            .login(LoginCommand::new(
                EmailAddress::new("fed@x.com").unwrap(),
                "anypassword".to_string(),
            ))
            .await;

        assert!(matches!(result, Err(AuthError::FederatedOnly)));
    }

    #[tokio::test]
    async fn test_google_login_invalid_token() {
        let repository = MockTestIdentityRepository::new();
        let mut verifier = MockTestGoogleVerifier::new();

        verifier.expect_verify().times(1).returning(|_| None);

        let service = service(repository, verifier);

        let result = service.google_login("bad-token").await;
        assert!(matches!(result, Err(AuthError::InvalidGoogleToken)));
    }

    #[tokio::test]
    async fn test_google_login_creates_identity_with_categories() {
        let mut repository = MockTestIdentityRepository::new();
        let mut verifier = MockTestGoogleVerifier::new();

        verifier
            .expect_verify()
            .times(1)
            .returning(|_| Some(profile("Fed@X.com", "google-sub-1")));

        repository
            .expect_find_by_email()
            .withf(|email| email.as_str() == "fed@x.com")
            .times(1)
            .returning(|_| Ok(None));

        repository
            .expect_create_with_categories()
            .withf(|identity, categories| {
                !identity.credentials.has_password()
                    && identity.credentials.google_id() == Some("google-sub-1")
                    && categories.len() == 11
            })
            .times(1)
            .returning(|identity, _| Ok(identity));

        let service = service(repository, verifier);

        let result = service
            .google_login("valid-token")
            .await
            .expect("Google login failed");

        assert_eq!(result.identity.email.as_str(), "fed@x.com");
        assert!(result.identity.credentials.has_google());
    }

    #[tokio::test]
    async fn test_google_login_links_existing_password_account() {
        let mut repository = MockTestIdentityRepository::new();
        let mut verifier = MockTestGoogleVerifier::new();

        verifier
            .expect_verify()
            .times(1)
            .returning(|_| Some(profile("user@x.com", "google-sub-2")));

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(password_identity("user@x.com", "$argon2id$h".into()))));

        repository
            .expect_update()
            .withf(|identity| {
                identity.credentials.has_password()
                    && identity.credentials.google_id() == Some("google-sub-2")
                    && identity.updated_at.is_some()
            })
            .times(1)
            .returning(|identity| Ok(identity));

        let service = service(repository, verifier);

        let result = service
            .google_login("valid-token")
            .await
            .expect("Google login failed");

        assert!(matches!(
            result.identity.credentials,
            Credentials::Both { .. }
        ));
    }

    #[tokio::test]
    async fn test_google_login_already_linked_is_idempotent() {
        let mut repository = MockTestIdentityRepository::new();
        let mut verifier = MockTestGoogleVerifier::new();

        verifier
            .expect_verify()
            .times(1)
            .returning(|_| Some(profile("fed@x.com", "google-sub-1")));

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(google_identity("fed@x.com", "google-sub-1"))));

        // No write on re-login
        repository.expect_update().times(0);
        repository.expect_create_with_categories().times(0);

        let service = service(repository, verifier);

        let result = service.google_login("valid-token").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_current_identity_success() {
        let mut repository = MockTestIdentityRepository::new();
        let verifier = MockTestGoogleVerifier::new();

        let identity = password_identity("user@x.com", "$argon2id$h".into());
        let identity_id = identity.id;
        repository
            .expect_find_by_id()
            .withf(move |id| *id == identity_id)
            .times(1)
            .returning(move |_| Ok(Some(identity.clone())));

        let service = service(repository, verifier);

        let result = service.current_identity(&identity_id).await.unwrap();
        assert_eq!(result.email.as_str(), "user@x.com");
    }

    #[tokio::test]
    async fn test_current_identity_removed_record_is_unauthenticated() {
        let mut repository = MockTestIdentityRepository::new();
        let verifier = MockTestGoogleVerifier::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = service(repository, verifier);

        let result = service.current_identity(&IdentityId::new()).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_full_registration_scenario() {
        // Register then request the current identity with the minted token
        let mut repository = MockTestIdentityRepository::new();
        let verifier = MockTestGoogleVerifier::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_create_with_categories()
            .times(1)
            .returning(|identity, _| Ok(identity));

        let issuer = token_issuer();
        let service = AuthService::new(
            Arc::new(repository),
            Arc::new(verifier),
            Arc::clone(&issuer),
        );

        let result = service
            .register(register_command("new@x.com", "longpassword1", "A"))
            .await
            .expect("Registration failed");

        let claims = issuer.validate(&result.token).expect("Token invalid");
        assert_eq!(claims.sub, result.identity.id.to_string());
        assert_eq!(claims.email, "new@x.com");
    }
}
