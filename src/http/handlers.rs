//! Gateway-owned endpoints: liveness, token issuance, token verification.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthError, Identity};
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub time: DateTime<Utc>,
}

/// Process liveness. Says nothing about backend health.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        time: Utc::now(),
    })
}

/// Query parameters of `POST /auth/token`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenRequest {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

pub async fn issue_token(
    State(state): State<AppState>,
    Query(request): Query<TokenRequest>,
) -> Response {
    tracing::info!(client_id = %request.client_id, "Token request received");

    match state.issuer.issue(&request.client_id, &request.client_secret) {
        Ok(token) => Json(TokenResponse {
            access_token: token.access_token,
        })
        .into_response(),
        Err(AuthError::Unauthorized(reason)) => {
            tracing::warn!(client_id = %request.client_id, reason, "Unauthorized token request");
            StatusCode::UNAUTHORIZED.into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Error generating token");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred while generating the token",
            )
                .into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Reached only with a valid token; see `require_authentication`.
pub async fn verify_token(Extension(identity): Extension<Identity>) -> Json<VerifyResponse> {
    tracing::debug!(client_id = %identity.subject, "Token verified");
    Json(VerifyResponse {
        message: "Token is valid",
        timestamp: Utc::now(),
    })
}
