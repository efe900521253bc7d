use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use crate::domain::identity::models::GoogleProfile;
use crate::identity::ports::GoogleVerifier;

const TOKENINFO_ENDPOINT: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Verifies Google ID tokens against the tokeninfo introspection endpoint.
///
/// Infallible towards callers: every failure mode (transport, non-2xx,
/// unparseable body, audience mismatch, expired token) collapses to `None`
/// and is logged for operability. With no configured client id the verifier
/// rejects everything without touching the network.
pub struct GoogleTokenVerifier {
    http_client: reqwest::Client,
    client_id: Option<String>,
    endpoint: String,
}

impl GoogleTokenVerifier {
    /// Create a verifier against Google's production endpoint.
    ///
    /// The client should carry a request timeout; an unresponsive provider
    /// must not stall login requests indefinitely.
    pub fn new(http_client: reqwest::Client, client_id: Option<String>) -> Self {
        Self::with_endpoint(http_client, client_id, TOKENINFO_ENDPOINT.to_string())
    }

    /// Create a verifier against a custom introspection endpoint (tests).
    pub fn with_endpoint(
        http_client: reqwest::Client,
        client_id: Option<String>,
        endpoint: String,
    ) -> Self {
        Self {
            http_client,
            client_id,
            endpoint,
        }
    }
}

/// Shape of Google's tokeninfo response. Everything is optional: the
/// endpoint returns strings and varies by token type.
#[derive(Debug, Deserialize)]
struct GoogleTokenInfo {
    sub: Option<String>,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
    aud: Option<String>,
    exp: Option<String>,
}

#[async_trait]
impl GoogleVerifier for GoogleTokenVerifier {
    async fn verify(&self, id_token: &str) -> Option<GoogleProfile> {
        // Fail safe: without a configured client id nothing can be accepted,
        // so don't bother the provider
        let Some(client_id) = self.client_id.as_deref() else {
            tracing::debug!("Google client id not configured; rejecting token");
            return None;
        };

        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Google tokeninfo request failed");
            })
            .ok()?;

        if !response.status().is_success() {
            tracing::warn!(
                status = response.status().as_u16(),
                "Google tokeninfo returned non-success status"
            );
            return None;
        }

        let info: GoogleTokenInfo = response
            .json()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Failed to parse Google tokeninfo response");
            })
            .ok()?;

        // The token must have been issued for this deployment
        if info.aud.as_deref() != Some(client_id) {
            tracing::warn!(aud = ?info.aud, "Google token audience mismatch");
            return None;
        }

        if let Some(exp) = &info.exp {
            let exp_unix: i64 = match exp.parse() {
                Ok(exp_unix) => exp_unix,
                Err(_) => {
                    tracing::warn!(exp = %exp, "Google token has malformed expiry");
                    return None;
                }
            };
            if exp_unix <= Utc::now().timestamp() {
                tracing::warn!("Google token is expired");
                return None;
            }
        }

        let (Some(sub), Some(email)) = (info.sub, info.email) else {
            tracing::warn!("Google tokeninfo response missing subject or email");
            return None;
        };

        Some(GoogleProfile {
            google_id: sub,
            email,
            name: info.name,
            picture_url: info.picture,
        })
    }
}
