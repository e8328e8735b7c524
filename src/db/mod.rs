//! Account store collaborator.
//!
//! The service talks to accounts through the [`AccountStore`] trait so the
//! Postgres backend can be swapped for the in-memory double in tests.

pub mod memory;
pub mod postgres;

pub use memory::MemoryAccountStore;
pub use postgres::PgAccountStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{NewUser, User};

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn create(&self, new_user: NewUser) -> Result<User>;

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()>;

    /// Enable TOTP: stores the encrypted secret and flips the account into
    /// the totp two-factor mode.
    async fn enable_totp(&self, id: Uuid, secret_enc: &str) -> Result<()>;

    /// Store a pending emailed one-time code with its expiry, flipping the
    /// account into the email two-factor mode if it is not already.
    async fn set_email_code(
        &self,
        id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Compare-and-clear of the pending emailed code.
    ///
    /// Returns true and clears the code in one atomic step iff the supplied
    /// code matches and has not expired at `now`. Two concurrent calls with
    /// the same code must not both return true.
    async fn consume_email_code(&self, id: Uuid, code: &str, now: DateTime<Utc>) -> Result<bool>;

    /// Disable two-factor entirely, clearing secrets and pending codes.
    async fn disable_two_factor(&self, id: Uuid) -> Result<()>;
}
