use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::AuthResponseData;
use crate::identity::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn google_login(
    State(state): State<AppState>,
    Json(body): Json<GoogleLoginRequest>,
) -> Result<ApiSuccess<AuthResponseData>, ApiError> {
    state
        .auth_service
        .google_login(&body.credential)
        .await
        .map_err(ApiError::from)
        .map(|ref authenticated| ApiSuccess::new(StatusCode::OK, authenticated.into()))
}

/// HTTP request body carrying the opaque Google ID token
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GoogleLoginRequest {
    credential: String,
}
