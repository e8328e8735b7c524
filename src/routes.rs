//! Router assembly.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, two_fa};
use crate::middleware::{audit_log, csrf_guard, security_headers, session_context};
use crate::AppState;

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/refresh-token", post(auth::refresh_token))
        .route("/auth/change-password", post(auth::change_password))
        .route("/auth/2fa/enable", post(two_fa::enable))
        .route("/auth/2fa/verify", post(two_fa::verify))
        .route("/auth/2fa/disable", post(two_fa::disable))
        .route("/auth/2fa/status", get(two_fa::status))
        .route("/auth/2fa/login-verify", post(auth::two_fa_login_verify))
        // Innermost first: session context runs inside the csrf guard, the
        // audit line covers csrf rejections too, and everything sits under
        // tracing and the header layer.
        .layer(from_fn_with_state(state.clone(), session_context))
        .layer(from_fn_with_state(state.clone(), csrf_guard))
        .layer(from_fn(audit_log))
        .layer(from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
