use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde_json::json;

use crate::domain::identity::models::IdentityId;
use crate::inbound::http::router::AppState;

/// Extension type storing the validated token subject in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedSubject {
    pub identity_id: IdentityId,
    pub email: String,
}

/// Middleware that validates bearer tokens and adds the subject to request
/// extensions. Every failure path is a structured 401; nothing panics on
/// malformed input.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token_from_header(&req)?;

    let claims = state.token_issuer.validate(token).map_err(|e| {
        tracing::debug!(error = %e, "Token validation failed");
        unauthorized("Invalid or expired token")
    })?;

    let identity_id = IdentityId::from_string(&claims.sub).map_err(|e| {
        tracing::warn!(error = %e, "Token subject is not a valid identity id");
        unauthorized("Invalid token format")
    })?;

    req.extensions_mut().insert(AuthenticatedSubject {
        identity_id,
        email: claims.email,
    });

    Ok(next.run(req).await)
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": message })),
    )
        .into_response()
}

fn extract_token_from_header(req: &Request) -> Result<&str, Response> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| unauthorized("Invalid Authorization header"))?;

    if !auth_str.starts_with("Bearer ") {
        return Err(unauthorized(
            "Invalid Authorization header format. Expected: Bearer <token>",
        ));
    }

    Ok(auth_str.trim_start_matches("Bearer "))
}
