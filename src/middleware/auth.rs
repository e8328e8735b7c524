//! Session context: resolves the access-token cookie into a [`CurrentUser`]
//! request extension.
//!
//! The layer itself never rejects; anonymous requests pass through so public
//! routes keep working. Protected handlers take [`CurrentUser`] as an
//! extractor and fail with an opaque 401 when it is absent, whether the
//! cookie was missing, malformed, expired, revoked, or the revocation
//! registry could not answer.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::cookies::{get_cookie_value, ACCESS_COOKIE};
use crate::error::AuthError;
use crate::AppState;

/// The authenticated account's email, present only when the request carried
/// a fully valid access token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

pub async fn session_context(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let mut current = None;
    if let Some(token) = get_cookie_value(req.headers(), ACCESS_COOKIE) {
        if let Ok(claims) = state.auth.verify_access(&token).await {
            current = Some(CurrentUser(claims.sub));
        }
    }

    if let Some(current) = &current {
        req.extensions_mut().insert(current.clone());
    }
    let mut response = next.run(req).await;
    // Echoed onto the response so the audit layer can attribute the request.
    if let Some(current) = current {
        response.extensions_mut().insert(current);
    }
    response
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::TokenInvalid)
    }
}
