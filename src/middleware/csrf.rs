//! Double-submit anti-forgery guard.
//!
//! State-changing requests must present the anti-forgery token twice, as the
//! `quill-csrf` cookie and the `x-csrf-token` header, and the two must match
//! byte for byte. A cross-site form post can make the browser attach the
//! cookie but cannot read it to fill the header.
//!
//! Safe methods mint the cookie when the client does not have one yet, so a
//! plain page load is enough to arm the protection.

use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

use crate::cookies::{
    constant_time_equal, csrf_cookie, get_cookie_value, header_value, CSRF_COOKIE, CSRF_HEADER,
};
use crate::error::AuthError;
use crate::AppState;

fn mint_token() -> String {
    let mut raw = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut raw);
    URL_SAFE_NO_PAD.encode(raw)
}

pub async fn csrf_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let cookie_token = get_cookie_value(req.headers(), CSRF_COOKIE);

    if matches!(
        method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    ) {
        let header_token = req
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok());
        let matched = match (cookie_token.as_deref(), header_token) {
            (Some(cookie), Some(header)) => constant_time_equal(cookie, header),
            _ => false,
        };
        if !matched {
            tracing::warn!(method = %method, path = %req.uri().path(), "request rejected by csrf guard");
            return AuthError::CsrfRejected.into_response();
        }
    }

    let mut response = next.run(req).await;

    // Arm clients that do not hold a token yet. Presenting one, even an
    // expired-on-the-client one, means no reissue.
    if matches!(method, Method::GET | Method::HEAD | Method::OPTIONS) && cookie_token.is_none() {
        if let Ok(value) = header_value(&csrf_cookie(&mint_token(), state.cookie_secure)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}
