//! Account and session orchestration: signup, login with the two-factor
//! branch, token refresh, logout revocation, and access verification.

use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::db::AccountStore;
use crate::error::{AuthError, Result};
use crate::models::{LoginRequest, NewUser, SignupRequest, TwoFactorKind, User};
use crate::security::jwt::{
    TokenIssuer, TokenType, ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS,
};
use crate::security::token_revocation::RevocationRegistry;
use crate::security::{hash_password, verify_password, Claims};
use crate::services::two_fa::TwoFaService;

const MIN_PASSWORD_LEN: usize = 8;

/// A freshly minted access/refresh pair.
#[derive(Debug)]
pub struct SessionTokens {
    pub access: String,
    pub refresh: String,
}

/// What a correct password buys: either a session, or a pending two-factor
/// challenge that must be completed first.
#[derive(Debug)]
pub enum LoginOutcome {
    TokensIssued { tokens: SessionTokens, user: User },
    ChallengeRequired { kind: TwoFactorKind, email: String },
}

#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    registry: Arc<dyn RevocationRegistry>,
    tokens: Arc<TokenIssuer>,
    two_fa: TwoFaService,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        registry: Arc<dyn RevocationRegistry>,
        tokens: Arc<TokenIssuer>,
        two_fa: TwoFaService,
    ) -> Self {
        Self {
            accounts,
            registry,
            tokens,
            two_fa,
        }
    }

    pub async fn signup(&self, req: SignupRequest) -> Result<User> {
        req.validate()
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        if req.password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        if self.accounts.find_by_email(&req.email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let user = self
            .accounts
            .create(NewUser {
                email: req.email,
                name: req.name,
                password_hash: hash_password(&req.password)?,
                picture: req.picture,
                tier: req.tier,
            })
            .await?;
        tracing::info!(account = %user.email, "account created");
        Ok(user)
    }

    /// Password login. The password is checked before the two-factor branch,
    /// so a wrong password never reveals whether a challenge would follow,
    /// and an unknown address gets the same rejection as a wrong password.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginOutcome> {
        req.validate()
            .map_err(|_| AuthError::InvalidCredentials)?;
        let user = self
            .accounts
            .find_by_email(&req.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(&req.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        if let Some(kind) = user.two_factor_kind() {
            if kind == TwoFactorKind::Email {
                // A challenged login always gets a fresh code; whatever was
                // pending is superseded.
                self.two_fa.issue_email_challenge(&user).await?;
            }
            tracing::info!(account = %user.email, kind = kind.as_str(), "login challenged");
            return Ok(LoginOutcome::ChallengeRequired {
                kind,
                email: user.email,
            });
        }

        let tokens = self.issue_session(&user.email)?;
        tracing::info!(account = %user.email, "login succeeded");
        Ok(LoginOutcome::TokensIssued { tokens, user })
    }

    /// Complete a challenged login with a second-factor code.
    pub async fn two_fa_login_verify(&self, email: &str, code: &str) -> Result<(SessionTokens, User)> {
        // An unknown address and an unenrolled account get the same rejection
        // as a wrong code.
        let user = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or(AuthError::ChallengeInvalid)?;
        if user.two_factor_kind().is_none() {
            return Err(AuthError::ChallengeInvalid);
        }

        self.two_fa.verify(&user, code).await?;

        let tokens = self.issue_session(&user.email)?;
        tracing::info!(account = %user.email, "challenged login completed");
        Ok((tokens, user))
    }

    fn issue_session(&self, subject: &str) -> Result<SessionTokens> {
        Ok(SessionTokens {
            access: self
                .tokens
                .issue(subject, TokenType::Access, ACCESS_TOKEN_TTL_SECS)?,
            refresh: self
                .tokens
                .issue(subject, TokenType::Refresh, REFRESH_TOKEN_TTL_SECS)?,
        })
    }

    /// Exchange a valid, unrevoked refresh token for a new access token. The
    /// refresh token itself is not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let claims = self.tokens.decode(refresh_token)?;
        if claims.token_type != TokenType::Refresh {
            tracing::debug!("non-refresh token presented for refresh");
            return Err(AuthError::TokenInvalid);
        }
        if self.registry.is_revoked(&claims.jti).await? {
            tracing::info!("revoked refresh token rejected");
            return Err(AuthError::TokenInvalid);
        }
        self.tokens
            .issue(&claims.sub, TokenType::Access, ACCESS_TOKEN_TTL_SECS)
    }

    /// Revoke whichever session tokens the request still carries, each for
    /// its remaining lifetime. Tokens that no longer decode are skipped; an
    /// expired token cannot be replayed and needs no denylist entry.
    pub async fn logout(&self, access: Option<&str>, refresh: Option<&str>) -> Result<()> {
        let now = Utc::now().timestamp();
        for token in [access, refresh].into_iter().flatten() {
            if let Ok(claims) = self.tokens.decode(token) {
                self.registry
                    .revoke(&claims.jti, claims.remaining_ttl(now))
                    .await?;
            }
        }
        Ok(())
    }

    /// Full access-token check for an incoming request: signature, expiry,
    /// access type, and the revocation registry. A registry that cannot
    /// answer fails the check.
    pub async fn verify_access(&self, token: &str) -> Result<Claims> {
        let claims = self.tokens.decode(token)?;
        if claims.token_type != TokenType::Access {
            tracing::debug!("non-access token presented as session");
            return Err(AuthError::TokenInvalid);
        }
        if self.registry.is_revoked(&claims.jti).await? {
            tracing::info!("revoked access token rejected");
            return Err(AuthError::TokenInvalid);
        }
        Ok(claims)
    }

    pub async fn change_password(&self, user: &User, old: &str, new: &str) -> Result<()> {
        if !verify_password(old, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        if new.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        self.accounts
            .update_password_hash(user.id, &hash_password(new)?)
            .await?;
        tracing::info!(account = %user.email, "password changed");
        Ok(())
    }

    pub async fn find_account(&self, email: &str) -> Result<Option<User>> {
        self.accounts.find_by_email(email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryAccountStore;
    use crate::security::token_revocation::MemoryRevocationRegistry;
    use crate::security::SecretBox;
    use crate::services::email::MemoryCodeDelivery;

    struct Fixture {
        auth: AuthService,
        registry: Arc<MemoryRevocationRegistry>,
        delivery: Arc<MemoryCodeDelivery>,
        two_fa: TwoFaService,
        accounts: Arc<MemoryAccountStore>,
    }

    fn fixture() -> Fixture {
        let accounts: Arc<MemoryAccountStore> = Arc::new(MemoryAccountStore::new());
        let registry = Arc::new(MemoryRevocationRegistry::new());
        let delivery = Arc::new(MemoryCodeDelivery::new());
        let two_fa = TwoFaService::new(
            accounts.clone(),
            delivery.clone(),
            SecretBox::new(&[5u8; 32]),
        );
        let auth = AuthService::new(
            accounts.clone(),
            registry.clone(),
            Arc::new(TokenIssuer::new("test-secret")),
            two_fa.clone(),
        );
        Fixture {
            auth,
            registry,
            delivery,
            two_fa,
            accounts,
        }
    }

    fn signup_req(email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            email: email.into(),
            name: "Test".into(),
            password: password.into(),
            picture: None,
            tier: "Free".into(),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn signup_then_login_issues_both_tokens() {
        let fx = fixture();
        fx.auth
            .signup(signup_req("a@x.com", "password123"))
            .await
            .unwrap();

        match fx.auth.login(login_req("a@x.com", "password123")).await.unwrap() {
            LoginOutcome::TokensIssued { tokens, user } => {
                assert_eq!(user.email, "a@x.com");
                fx.auth.verify_access(&tokens.access).await.unwrap();
                assert!(fx.auth.refresh(&tokens.refresh).await.is_ok());
            }
            LoginOutcome::ChallengeRequired { .. } => panic!("unexpected challenge"),
        }
    }

    #[tokio::test]
    async fn signup_rejects_short_password_and_duplicates() {
        let fx = fixture();
        assert!(matches!(
            fx.auth.signup(signup_req("a@x.com", "short")).await.unwrap_err(),
            AuthError::WeakPassword
        ));
        fx.auth
            .signup(signup_req("a@x.com", "password123"))
            .await
            .unwrap();
        assert!(matches!(
            fx.auth
                .signup(signup_req("a@x.com", "password123"))
                .await
                .unwrap_err(),
            AuthError::EmailAlreadyExists
        ));
    }

    #[tokio::test]
    async fn unknown_account_and_wrong_password_are_indistinguishable() {
        let fx = fixture();
        fx.auth
            .signup(signup_req("a@x.com", "password123"))
            .await
            .unwrap();

        let unknown = fx
            .auth
            .login(login_req("nobody@x.com", "password123"))
            .await
            .unwrap_err();
        let wrong = fx
            .auth
            .login(login_req("a@x.com", "wrong-password"))
            .await
            .unwrap_err();
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn wrong_password_beats_two_factor_branch() {
        let fx = fixture();
        let user = fx
            .auth
            .signup(signup_req("a@x.com", "password123"))
            .await
            .unwrap();
        fx.two_fa.enable(&user, TwoFactorKind::Email).await.unwrap();

        // Wrong password on a challenged account: plain credential rejection,
        // no challenge leaked, no code dispatched.
        let sent_before = fx.delivery.sent_count().await;
        assert!(matches!(
            fx.auth
                .login(login_req("a@x.com", "wrong-password"))
                .await
                .unwrap_err(),
            AuthError::InvalidCredentials
        ));
        assert_eq!(fx.delivery.sent_count().await, sent_before);
    }

    #[tokio::test]
    async fn challenged_login_withholds_tokens_until_code_verifies() {
        let fx = fixture();
        let user = fx
            .auth
            .signup(signup_req("a@x.com", "password123"))
            .await
            .unwrap();
        fx.two_fa.enable(&user, TwoFactorKind::Email).await.unwrap();

        match fx.auth.login(login_req("a@x.com", "password123")).await.unwrap() {
            LoginOutcome::ChallengeRequired { kind, email } => {
                assert_eq!(kind, TwoFactorKind::Email);
                assert_eq!(email, "a@x.com");
            }
            LoginOutcome::TokensIssued { .. } => panic!("tokens issued before challenge"),
        }

        // A fresh code was dispatched by the login itself.
        let code = fx.delivery.last_code_for("a@x.com").await.unwrap();

        assert!(matches!(
            fx.auth.two_fa_login_verify("a@x.com", "000000").await.unwrap_err(),
            AuthError::ChallengeInvalid
        ));

        let (tokens, user) = fx.auth.two_fa_login_verify("a@x.com", &code).await.unwrap();
        assert_eq!(user.email, "a@x.com");
        fx.auth.verify_access(&tokens.access).await.unwrap();
    }

    #[tokio::test]
    async fn login_verify_rejects_unenrolled_accounts() {
        let fx = fixture();
        fx.auth
            .signup(signup_req("a@x.com", "password123"))
            .await
            .unwrap();
        assert!(matches!(
            fx.auth.two_fa_login_verify("a@x.com", "123456").await.unwrap_err(),
            AuthError::ChallengeInvalid
        ));
        assert!(matches!(
            fx.auth
                .two_fa_login_verify("nobody@x.com", "123456")
                .await
                .unwrap_err(),
            AuthError::ChallengeInvalid
        ));
    }

    #[tokio::test]
    async fn logout_revokes_presented_tokens() {
        let fx = fixture();
        fx.auth
            .signup(signup_req("a@x.com", "password123"))
            .await
            .unwrap();
        let tokens = match fx.auth.login(login_req("a@x.com", "password123")).await.unwrap() {
            LoginOutcome::TokensIssued { tokens, .. } => tokens,
            LoginOutcome::ChallengeRequired { .. } => panic!("unexpected challenge"),
        };

        fx.auth
            .logout(Some(&tokens.access), Some(&tokens.refresh))
            .await
            .unwrap();

        assert!(fx.auth.verify_access(&tokens.access).await.is_err());
        assert!(matches!(
            fx.auth.refresh(&tokens.refresh).await.unwrap_err(),
            AuthError::TokenInvalid
        ));
    }

    #[tokio::test]
    async fn logout_skips_undecodable_tokens() {
        let fx = fixture();
        fx.auth.logout(Some("garbage"), None).await.unwrap();
        fx.auth.logout(None, None).await.unwrap();
    }

    #[tokio::test]
    async fn refresh_rejects_access_tokens() {
        let fx = fixture();
        fx.auth
            .signup(signup_req("a@x.com", "password123"))
            .await
            .unwrap();
        let tokens = match fx.auth.login(login_req("a@x.com", "password123")).await.unwrap() {
            LoginOutcome::TokensIssued { tokens, .. } => tokens,
            LoginOutcome::ChallengeRequired { .. } => panic!("unexpected challenge"),
        };
        assert!(matches!(
            fx.auth.refresh(&tokens.access).await.unwrap_err(),
            AuthError::TokenInvalid
        ));
        // And the other direction: a refresh token is not a session.
        assert!(matches!(
            fx.auth.verify_access(&tokens.refresh).await.unwrap_err(),
            AuthError::TokenInvalid
        ));
    }

    #[tokio::test]
    async fn registry_outage_fails_closed() {
        let fx = fixture();
        fx.auth
            .signup(signup_req("a@x.com", "password123"))
            .await
            .unwrap();
        let tokens = match fx.auth.login(login_req("a@x.com", "password123")).await.unwrap() {
            LoginOutcome::TokensIssued { tokens, .. } => tokens,
            LoginOutcome::ChallengeRequired { .. } => panic!("unexpected challenge"),
        };

        fx.registry.set_unavailable(true);
        assert!(matches!(
            fx.auth.verify_access(&tokens.access).await.unwrap_err(),
            AuthError::RegistryUnavailable
        ));
        assert!(matches!(
            fx.auth.refresh(&tokens.refresh).await.unwrap_err(),
            AuthError::RegistryUnavailable
        ));
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let fx = fixture();
        let user = fx
            .auth
            .signup(signup_req("a@x.com", "password123"))
            .await
            .unwrap();

        assert!(matches!(
            fx.auth
                .change_password(&user, "wrong-password", "newpassword1")
                .await
                .unwrap_err(),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            fx.auth
                .change_password(&user, "password123", "short")
                .await
                .unwrap_err(),
            AuthError::WeakPassword
        ));

        fx.auth
            .change_password(&user, "password123", "newpassword1")
            .await
            .unwrap();
        let updated = fx.accounts.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(verify_password("newpassword1", &updated.password_hash).unwrap());
        assert!(!verify_password("password123", &updated.password_hash).unwrap());
    }
}
