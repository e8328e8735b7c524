//! Account and session endpoints.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::cookies::{
    access_cookie, clear_cookie, get_cookie_value, header_value, refresh_cookie, ACCESS_COOKIE,
    REFRESH_COOKIE,
};
use crate::error::{AuthError, Result};
use crate::middleware::CurrentUser;
use crate::models::{ChangePasswordRequest, LoginRequest, SignupRequest, User};
use crate::services::{LoginOutcome, SessionTokens};
use crate::AppState;

fn user_summary(user: &User) -> serde_json::Value {
    json!({
        "email": user.email,
        "name": user.name,
        "picture": user.picture,
        "tier": user.tier,
    })
}

/// Body plus the two session cookies.
fn session_response(
    tokens: &SessionTokens,
    user: &User,
    cookie_secure: bool,
) -> Result<Response> {
    // AppendHeaders: a plain header array would overwrite the first
    // Set-Cookie with the second.
    let headers = AppendHeaders([
        (
            header::SET_COOKIE,
            header_value(&access_cookie(&tokens.access, cookie_secure))?,
        ),
        (
            header::SET_COOKIE,
            header_value(&refresh_cookie(&tokens.refresh, cookie_secure))?,
        ),
    ]);
    let body = Json(json!({ "ok": true, "user": user_summary(user) }));
    Ok((headers, body).into_response())
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<serde_json::Value>> {
    state.auth.signup(req).await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response> {
    match state.auth.login(req).await? {
        LoginOutcome::TokensIssued { tokens, user } => {
            session_response(&tokens, &user, state.cookie_secure)
        }
        // No tokens yet: the client must come back through login-verify.
        LoginOutcome::ChallengeRequired { kind, email } => Ok(Json(json!({
            "ok": false,
            "2fa_required": true,
            "type": kind.as_str(),
            "email": email,
        }))
        .into_response()),
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let access = get_cookie_value(&headers, ACCESS_COOKIE);
    let refresh = get_cookie_value(&headers, REFRESH_COOKIE);
    state.auth.logout(access.as_deref(), refresh.as_deref()).await?;

    let headers = AppendHeaders([
        (
            header::SET_COOKIE,
            header_value(&clear_cookie(ACCESS_COOKIE, state.cookie_secure))?,
        ),
        (
            header::SET_COOKIE,
            header_value(&clear_cookie(REFRESH_COOKIE, state.cookie_secure))?,
        ),
    ]);
    Ok((headers, Json(json!({ "ok": true }))).into_response())
}

pub async fn refresh_token(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let refresh = get_cookie_value(&headers, REFRESH_COOKIE).ok_or(AuthError::TokenInvalid)?;
    let access = state.auth.refresh(&refresh).await?;

    let headers = AppendHeaders([(
        header::SET_COOKIE,
        header_value(&access_cookie(&access, state.cookie_secure))?,
    )]);
    Ok((headers, Json(json!({ "ok": true }))).into_response())
}

pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    let user = state
        .auth
        .find_account(&current.0)
        .await?
        .ok_or(AuthError::TokenInvalid)?;
    state
        .auth
        .change_password(&user, &req.old_password, &req.new_password)
        .await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn two_fa_login_verify(
    State(state): State<AppState>,
    Json(req): Json<crate::models::TwoFaLoginVerifyRequest>,
) -> Result<Response> {
    let (tokens, user) = state.auth.two_fa_login_verify(&req.email, &req.code).await?;
    session_response(&tokens, &user, state.cookie_secure)
}
