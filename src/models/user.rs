use chrono::{DateTime, Utc};
/// Account record and request DTOs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Which second factor an account uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TwoFactorKind {
    Totp,
    Email,
}

impl TwoFactorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TwoFactorKind::Totp => "totp",
            TwoFactorKind::Email => "email",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "totp" => Some(TwoFactorKind::Totp),
            "email" => Some(TwoFactorKind::Email),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub picture: Option<String>,
    pub tier: String,
    pub twofa_enabled: bool,
    /// "totp" or "email" when enabled.
    pub twofa_type: Option<String>,
    /// Encrypted TOTP secret (nonce || ciphertext, base64).
    #[serde(skip_serializing)]
    pub twofa_secret_enc: Option<String>,
    /// Pending emailed one-time code, cleared on successful verification.
    #[serde(skip_serializing)]
    pub twofa_email_code: Option<String>,
    pub twofa_email_code_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn two_factor_kind(&self) -> Option<TwoFactorKind> {
        if !self.twofa_enabled {
            return None;
        }
        self.twofa_type.as_deref().and_then(TwoFactorKind::parse)
    }
}

/// Fields required to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub picture: Option<String>,
    pub tier: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    pub name: String,
    pub password: String,
    pub picture: Option<String>,
    #[serde(default = "default_tier")]
    pub tier: String,
}

fn default_tier() -> String {
    "Free".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct TwoFaEnableRequest {
    #[serde(rename = "type")]
    pub kind: TwoFactorKind,
}

#[derive(Debug, Deserialize)]
pub struct TwoFaVerifyRequest {
    pub code: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TwoFaLoginVerifyRequest {
    #[validate(email)]
    pub email: String,
    pub code: String,
}
