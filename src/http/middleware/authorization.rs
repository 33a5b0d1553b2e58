//! Role-based path authorization for proxied routes.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{DecisionReason, Identity};
use crate::http::server::AppState;

pub async fn authorize(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let identity = request.extensions().get::<Identity>();
    let decision = state.authorizer.authorize(identity, request.uri().path());

    if decision.allow {
        return next.run(request).await;
    }

    let body = match decision.reason {
        DecisionReason::MissingClaims => "Forbidden: Role or ClientId is missing.",
        _ => "Forbidden",
    };
    (StatusCode::FORBIDDEN, body).into_response()
}
