/// Postgres-backed account store
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::AccountStore;
use crate::error::Result;
use crate::models::{NewUser, User};

#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, picture, tier,
                   twofa_enabled, twofa_type, twofa_secret_enc,
                   twofa_email_code, twofa_email_code_expiry, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, password_hash, picture, tier, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING id, email, name, password_hash, picture, tier,
                      twofa_enabled, twofa_type, twofa_secret_enc,
                      twofa_email_code, twofa_email_code_expiry, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.password_hash)
        .bind(&new_user.picture)
        .bind(&new_user.tier)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn enable_totp(&self, id: Uuid, secret_enc: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET twofa_enabled = TRUE,
                twofa_type = 'totp',
                twofa_secret_enc = $2,
                twofa_email_code = NULL,
                twofa_email_code_expiry = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(secret_enc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_email_code(
        &self,
        id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET twofa_enabled = TRUE,
                twofa_type = 'email',
                twofa_secret_enc = NULL,
                twofa_email_code = $2,
                twofa_email_code_expiry = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn consume_email_code(&self, id: Uuid, code: &str, now: DateTime<Utc>) -> Result<bool> {
        // Single conditional UPDATE: the row-level check and the clear happen
        // atomically, so two concurrent verifications of the same code cannot
        // both observe a match.
        let result = sqlx::query(
            r#"
            UPDATE users
            SET twofa_email_code = NULL,
                twofa_email_code_expiry = NULL
            WHERE id = $1
              AND twofa_email_code = $2
              AND twofa_email_code_expiry IS NOT NULL
              AND twofa_email_code_expiry > $3
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn disable_two_factor(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET twofa_enabled = FALSE,
                twofa_type = NULL,
                twofa_secret_enc = NULL,
                twofa_email_code = NULL,
                twofa_email_code_expiry = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
