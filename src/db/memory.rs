/// In-memory account store used by the test suites and local development.
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::AccountStore;
use crate::error::{AuthError, Result};
use crate::models::{NewUser, User};

#[derive(Default)]
pub struct MemoryAccountStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn with_user<F>(&self, id: Uuid, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.lock().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AuthError::Store("no such account".to_string()))?;
        mutate(user);
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User> {
        let mut users = self.users.lock().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Err(AuthError::EmailAlreadyExists);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            name: new_user.name,
            password_hash: new_user.password_hash,
            picture: new_user.picture,
            tier: new_user.tier,
            twofa_enabled: false,
            twofa_type: None,
            twofa_secret_enc: None,
            twofa_email_code: None,
            twofa_email_code_expiry: None,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()> {
        self.with_user(id, |u| u.password_hash = password_hash.to_string())
            .await
    }

    async fn enable_totp(&self, id: Uuid, secret_enc: &str) -> Result<()> {
        self.with_user(id, |u| {
            u.twofa_enabled = true;
            u.twofa_type = Some("totp".to_string());
            u.twofa_secret_enc = Some(secret_enc.to_string());
            u.twofa_email_code = None;
            u.twofa_email_code_expiry = None;
        })
        .await
    }

    async fn set_email_code(
        &self,
        id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_user(id, |u| {
            u.twofa_enabled = true;
            u.twofa_type = Some("email".to_string());
            u.twofa_secret_enc = None;
            u.twofa_email_code = Some(code.to_string());
            u.twofa_email_code_expiry = Some(expires_at);
        })
        .await
    }

    async fn consume_email_code(&self, id: Uuid, code: &str, now: DateTime<Utc>) -> Result<bool> {
        // Check and clear under one lock hold: concurrent calls serialize
        // here, so only the first matching call observes the code.
        let mut users = self.users.lock().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AuthError::Store("no such account".to_string()))?;

        let matches = user.twofa_email_code.as_deref() == Some(code)
            && user
                .twofa_email_code_expiry
                .map(|expiry| now < expiry)
                .unwrap_or(false);

        if matches {
            user.twofa_email_code = None;
            user.twofa_email_code_expiry = None;
        }
        Ok(matches)
    }

    async fn disable_two_factor(&self, id: Uuid) -> Result<()> {
        self.with_user(id, |u| {
            u.twofa_enabled = false;
            u.twofa_type = None;
            u.twofa_secret_enc = None;
            u.twofa_email_code = None;
            u.twofa_email_code_expiry = None;
        })
        .await
    }
}
