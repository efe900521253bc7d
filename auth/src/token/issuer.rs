use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::TokenError;

/// Signing material and token parameters, constructed once at startup and
/// injected into the issuer. Request handling never reads ambient config.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Symmetric signing secret (at least 32 bytes for HS256)
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub lifetime_minutes: i64,
}

/// Issues and validates signed, time-bounded identity tokens.
///
/// Uses HS256. Tokens have exactly two states, valid and invalid, decided
/// by signature and time; there is no server-side revocation.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer,
            audience: config.audience,
            lifetime: Duration::minutes(config.lifetime_minutes),
        }
    }

    /// Mint a token for an authenticated identity.
    ///
    /// # Arguments
    /// * `subject` - Identity id (uuid string)
    /// * `email` - Email claim
    ///
    /// # Returns
    /// Signed JWT string with `exp = now + lifetime`
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(&self, subject: &str, email: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            email: email.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Validate a token and return its claims.
    ///
    /// Checks signature, issuer, audience, and expiry with zero clock-skew
    /// leeway: a token whose expiry equals the current instant is already
    /// invalid. Any malformed input yields `Err`; this function sits on the
    /// request-authentication hot path and must never panic.
    ///
    /// # Errors
    /// * `Expired` - Expiry is at or before the current instant
    /// * `Invalid` - Malformed token, bad signature, or wrong issuer/audience
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid(e.to_string()),
                }
            })?;

        // jsonwebtoken still accepts exp == now; the contract here is a
        // strict bound, so the boundary instant is rejected explicitly.
        if token_data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TokenConfig {
        TokenConfig {
            secret: "test_secret_key_at_least_32_bytes!".to_string(),
            issuer: "budgeting-be".to_string(),
            audience: "budgeting-fe".to_string(),
            lifetime_minutes: 60,
        }
    }

    fn encode_with(config: &TokenConfig, claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .expect("Failed to encode token")
    }

    #[test]
    fn test_issue_and_validate_round_trip() {
        let issuer = TokenIssuer::new(test_config());

        let token = issuer
            .issue("user-123", "test@example.com")
            .expect("Failed to issue token");

        let claims = issuer.validate(&token).expect("Failed to validate token");
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.iss, "budgeting-be");
        assert_eq!(claims.aud, "budgeting-fe");
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn test_validate_malformed_token() {
        let issuer = TokenIssuer::new(test_config());

        assert!(matches!(
            issuer.validate("not.a.token"),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(issuer.validate(""), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_validate_wrong_secret() {
        let issuer = TokenIssuer::new(test_config());
        let other = TokenIssuer::new(TokenConfig {
            secret: "another_secret_key_at_least_32_bytes!".to_string(),
            ..test_config()
        });

        let token = other
            .issue("user-123", "test@example.com")
            .expect("Failed to issue token");

        assert!(issuer.validate(&token).is_err());
    }

    #[test]
    fn test_validate_wrong_issuer() {
        let issuer = TokenIssuer::new(test_config());
        let other = TokenIssuer::new(TokenConfig {
            issuer: "someone-else".to_string(),
            ..test_config()
        });

        let token = other
            .issue("user-123", "test@example.com")
            .expect("Failed to issue token");

        assert!(issuer.validate(&token).is_err());
    }

    #[test]
    fn test_validate_wrong_audience() {
        let issuer = TokenIssuer::new(test_config());
        let other = TokenIssuer::new(TokenConfig {
            audience: "another-app".to_string(),
            ..test_config()
        });

        let token = other
            .issue("user-123", "test@example.com")
            .expect("Failed to issue token");

        assert!(issuer.validate(&token).is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let config = test_config();
        let issuer = TokenIssuer::new(config.clone());

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user-123".to_string(),
            email: "test@example.com".to_string(),
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            iat: now - 3600,
            exp: now - 60,
        };
        let token = encode_with(&config, &claims);

        assert!(matches!(issuer.validate(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_validate_expiry_boundary_is_invalid() {
        let config = test_config();
        let issuer = TokenIssuer::new(config.clone());

        // exp == now: valid "until exactly T" means invalid at T
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user-123".to_string(),
            email: "test@example.com".to_string(),
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            iat: now - 3600,
            exp: now,
        };
        let token = encode_with(&config, &claims);

        assert!(matches!(issuer.validate(&token), Err(TokenError::Expired)));
    }
}
