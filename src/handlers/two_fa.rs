//! Two-factor management endpoints. All of these operate on the account
//! behind the current session.

use axum::{extract::State, Json};
use serde_json::json;

use crate::error::{AuthError, Result};
use crate::middleware::CurrentUser;
use crate::models::{TwoFaEnableRequest, TwoFaVerifyRequest, User};
use crate::services::TwoFaEnrollment;
use crate::AppState;

async fn current_account(state: &AppState, current: &CurrentUser) -> Result<User> {
    state
        .auth
        .find_account(&current.0)
        .await?
        .ok_or(AuthError::TokenInvalid)
}

pub async fn enable(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<TwoFaEnableRequest>,
) -> Result<Json<serde_json::Value>> {
    let user = current_account(&state, &current).await?;
    match state.two_fa.enable(&user, req.kind).await? {
        // The raw secret is returned exactly once, at enrollment.
        TwoFaEnrollment::Totp { secret, otpauth_url } => Ok(Json(json!({
            "ok": true,
            "type": "totp",
            "secret": secret,
            "otpauth_url": otpauth_url,
        }))),
        TwoFaEnrollment::Email => Ok(Json(json!({ "ok": true, "type": "email" }))),
    }
}

/// Confirm enrollment by proving possession of the second factor.
pub async fn verify(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<TwoFaVerifyRequest>,
) -> Result<Json<serde_json::Value>> {
    let user = current_account(&state, &current).await?;
    state.two_fa.verify(&user, &req.code).await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn disable(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<serde_json::Value>> {
    let user = current_account(&state, &current).await?;
    state.two_fa.disable(&user).await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn status(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<serde_json::Value>> {
    let user = current_account(&state, &current).await?;
    Ok(Json(json!({
        "enabled": user.twofa_enabled,
        "type": user.twofa_type,
    })))
}
