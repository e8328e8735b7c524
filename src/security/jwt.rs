/// Session token issuance and verification
///
/// Tokens are self-describing JWTs signed with HS256 under a server-held
/// secret injected at construction. Every token carries a unique `jti` so it
/// can be revoked individually before its natural expiry.
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, Result};

/// Access tokens are short-lived: they ride along on every request, so theft
/// only buys a small window.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Refresh tokens are long-lived and presented only to mint a new access
/// token; they are the one credential whose compromise warrants revocation.
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account email.
    pub sub: String,
    /// Issued-at, epoch seconds.
    pub iat: i64,
    /// Expiry, epoch seconds.
    pub exp: i64,
    /// Unique token identifier, never reused.
    pub jti: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

impl Claims {
    /// Seconds of validity left at `now_secs`. Zero or negative means the
    /// token has already expired.
    pub fn remaining_ttl(&self, now_secs: i64) -> i64 {
        self.exp - now_secs
    }
}

/// Mints and checks session tokens. Holds the signing keys; no globals, so
/// tests and secret rotation construct fresh issuers.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for `subject` expiring `ttl_secs` from now.
    pub fn issue(&self, subject: &str, token_type: TokenType, ttl_secs: i64) -> Result<String> {
        self.issue_at(subject, token_type, ttl_secs, Utc::now().timestamp())
    }

    /// Issue with an explicit clock. Used by `issue` and by tests that need
    /// tokens straddling the expiry boundary.
    pub fn issue_at(
        &self,
        subject: &str,
        token_type: TokenType,
        ttl_secs: i64,
        now_secs: i64,
    ) -> Result<String> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: now_secs,
            exp: now_secs + ttl_secs,
            jti: Uuid::new_v4().to_string(),
            token_type,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Check signature and expiry, returning the claims.
    ///
    /// Every failure collapses to `TokenInvalid`; the reason is logged here
    /// and never surfaced to the caller. The revocation check is layered on
    /// top by the caller, since it requires the registry.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        // Strict expiry: no leeway window after `exp`.
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => {
                tracing::debug!(reason = %e, "token rejected");
                Err(AuthError::TokenInvalid)
            }
        }
    }
}
