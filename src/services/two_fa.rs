//! Two-factor challenge engine.
//!
//! Two variants share one verification surface:
//! - **totp**: an authenticator-app code derived from a shared secret held
//!   encrypted at rest, valid within one 30-second step of skew.
//! - **email**: a 6-digit code mailed to the account, valid for 10 minutes
//!   and consumed on first successful use.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;

use crate::db::AccountStore;
use crate::error::{AuthError, Result};
use crate::models::{TwoFactorKind, User};
use crate::security::{totp, SecretBox};
use crate::services::email::CodeDelivery;

const EMAIL_CODE_TTL_MINUTES: i64 = 10;

/// What enabling two-factor hands back to the client.
pub enum TwoFaEnrollment {
    /// Raw base32 secret and provisioning URI, shown exactly once so the
    /// account can register an authenticator app.
    Totp { secret: String, otpauth_url: String },
    /// A code was dispatched to the account's email address.
    Email,
}

#[derive(Clone)]
pub struct TwoFaService {
    accounts: Arc<dyn AccountStore>,
    delivery: Arc<dyn CodeDelivery>,
    secret_box: SecretBox,
}

impl TwoFaService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        delivery: Arc<dyn CodeDelivery>,
        secret_box: SecretBox,
    ) -> Self {
        Self {
            accounts,
            delivery,
            secret_box,
        }
    }

    /// Enable two-factor for `user` in the requested mode.
    pub async fn enable(&self, user: &User, kind: TwoFactorKind) -> Result<TwoFaEnrollment> {
        match kind {
            TwoFactorKind::Totp => {
                let secret = totp::generate_secret();
                let sealed = self.secret_box.seal(&secret, user.email.as_bytes())?;
                self.accounts.enable_totp(user.id, &sealed).await?;
                tracing::info!(account = %user.email, "totp two-factor enabled");
                Ok(TwoFaEnrollment::Totp {
                    secret: totp::secret_to_base32(&secret),
                    otpauth_url: totp::provisioning_uri(&user.email, &secret),
                })
            }
            TwoFactorKind::Email => {
                self.issue_email_challenge(user).await?;
                tracing::info!(account = %user.email, "email two-factor enabled");
                Ok(TwoFaEnrollment::Email)
            }
        }
    }

    /// Generate a fresh 6-digit code, persist it with its expiry, and
    /// dispatch it. Any previously pending code is superseded.
    pub async fn issue_email_challenge(&self, user: &User) -> Result<()> {
        let code = format!("{:06}", rand::thread_rng().gen_range(100_000..=999_999));
        let expires_at = Utc::now() + Duration::minutes(EMAIL_CODE_TTL_MINUTES);
        self.accounts
            .set_email_code(user.id, &code, expires_at)
            .await?;
        self.delivery.send_code(&user.email, &code).await
    }

    /// Verify a presented code against the account's active mode. Used both
    /// to confirm enrollment and to complete a challenged login.
    pub async fn verify(&self, user: &User, code: &str) -> Result<()> {
        match user.two_factor_kind() {
            None => Err(AuthError::TwoFactorNotEnabled),
            Some(TwoFactorKind::Totp) => {
                let sealed = user
                    .twofa_secret_enc
                    .as_deref()
                    .ok_or_else(|| AuthError::Internal("totp account has no secret".into()))?;
                let secret = self.secret_box.open(sealed, user.email.as_bytes())?;
                if totp::verify_code(&secret, code) {
                    Ok(())
                } else {
                    Err(AuthError::ChallengeInvalid)
                }
            }
            Some(TwoFactorKind::Email) => {
                // Atomic compare-and-clear: the code is single-use even under
                // concurrent verification attempts.
                if self
                    .accounts
                    .consume_email_code(user.id, code, Utc::now())
                    .await?
                {
                    Ok(())
                } else {
                    Err(AuthError::ChallengeInvalid)
                }
            }
        }
    }

    /// Clear secrets and pending codes and drop back to password-only login.
    pub async fn disable(&self, user: &User) -> Result<()> {
        self.accounts.disable_two_factor(user.id).await?;
        tracing::info!(account = %user.email, "two-factor disabled");
        Ok(())
    }
}
