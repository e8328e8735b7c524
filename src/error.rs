use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password or unknown subject. Identical response for both so the
    /// endpoint cannot be used to enumerate accounts.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Any token verification failure: malformed, bad signature, expired, or
    /// revoked. Deliberately undifferentiated to callers; the distinction is
    /// logged internally where the failure is detected.
    #[error("Invalid token")]
    TokenInvalid,

    /// Password verified but a second factor is still pending.
    #[error("Two-factor challenge required")]
    ChallengeRequired,

    /// Wrong or expired second-factor code.
    #[error("Invalid two-factor code")]
    ChallengeInvalid,

    #[error("Two-factor authentication not enabled")]
    TwoFactorNotEnabled,

    /// Missing or mismatched anti-forgery token.
    #[error("CSRF token missing or invalid")]
    CsrfRejected,

    /// Revocation store unreachable or timed out. Fail-closed: surfaces as an
    /// authentication failure, never as "not revoked".
    #[error("Revocation registry unavailable")]
    RegistryUnavailable,

    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Password too short")]
    WeakPassword,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            // One opaque rejection for every token failure mode, including an
            // unavailable registry: fail-closed, and no oracle for why.
            AuthError::TokenInvalid => {
                (StatusCode::UNAUTHORIZED, "Not authenticated".to_string())
            }
            AuthError::RegistryUnavailable => {
                tracing::error!("revocation registry unavailable; rejecting token");
                (StatusCode::UNAUTHORIZED, "Not authenticated".to_string())
            }
            AuthError::ChallengeRequired => (
                StatusCode::UNAUTHORIZED,
                "Two-factor verification required".to_string(),
            ),
            AuthError::ChallengeInvalid => (
                StatusCode::UNAUTHORIZED,
                "Invalid or expired 2FA code".to_string(),
            ),
            AuthError::TwoFactorNotEnabled => {
                (StatusCode::BAD_REQUEST, "2FA not enabled".to_string())
            }
            AuthError::CsrfRejected => (
                StatusCode::FORBIDDEN,
                "CSRF token missing or invalid".to_string(),
            ),
            AuthError::EmailAlreadyExists => {
                (StatusCode::BAD_REQUEST, "Email already registered".to_string())
            }
            AuthError::WeakPassword => {
                (StatusCode::BAD_REQUEST, "Password too short".to_string())
            }
            AuthError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AuthError::Store(msg) => {
                tracing::error!(error = %msg, "account store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AuthError::Internal(msg) => {
                tracing::error!(error = %msg, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "ok": false,
            "detail": message,
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Store(err.to_string())
    }
}
