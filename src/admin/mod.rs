//! Admin API.
//!
//! Every endpoint requires `Authorization: Bearer <admin.api_key>`.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(get_routes))
        .route("/admin/circuits", get(get_circuits))
        .route("/admin/circuits/{key}", get(get_circuit))
        .route("/admin/circuits/{key}/reset", post(reset_circuit))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
