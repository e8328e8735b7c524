/// Revocation registry: a shared denylist of revoked token identifiers
///
/// Backed by Redis so every server instance observes a revocation the moment
/// it lands. Entries carry the token's remaining lifetime as their TTL and
/// self-expire; no cleanup pass exists or is needed.
///
/// Availability failures are fail-closed: a registry that cannot answer makes
/// the token invalid, it never silently passes as "not revoked".
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::error::{AuthError, Result};

const KEY_PREFIX: &str = "quill:revoked:jti:";

/// Per-call ceiling on registry I/O. A timeout is a registry failure, not a
/// clean "not revoked".
const REGISTRY_TIMEOUT: Duration = Duration::from_secs(2);

#[async_trait]
pub trait RevocationRegistry: Send + Sync {
    /// Record `jti` as revoked for `remaining_ttl_secs`. A zero or negative
    /// TTL is a no-op: the token is already expired and cannot be replayed.
    async fn revoke(&self, jti: &str, remaining_ttl_secs: i64) -> Result<()>;

    /// Whether `jti` is currently revoked.
    async fn is_revoked(&self, jti: &str) -> Result<bool>;
}

/// Production registry on a shared Redis instance.
#[derive(Clone)]
pub struct RedisRevocationRegistry {
    conn: ConnectionManager,
}

impl RedisRevocationRegistry {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn key(jti: &str) -> String {
        format!("{}{}", KEY_PREFIX, jti)
    }
}

#[async_trait]
impl RevocationRegistry for RedisRevocationRegistry {
    async fn revoke(&self, jti: &str, remaining_ttl_secs: i64) -> Result<()> {
        if remaining_ttl_secs <= 0 {
            return Ok(());
        }

        let mut conn = self.conn.clone();
        let write = async {
            redis::cmd("SET")
                .arg(Self::key(jti))
                .arg("1")
                .arg("EX")
                .arg(remaining_ttl_secs as u64)
                .query_async::<_, ()>(&mut conn)
                .await
        };

        match timeout(REGISTRY_TIMEOUT, write).await {
            Ok(Ok(())) => {
                tracing::info!(ttl_secs = remaining_ttl_secs, "token identifier revoked");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "revocation write failed");
                Err(AuthError::RegistryUnavailable)
            }
            Err(_) => {
                tracing::error!("revocation write timed out");
                Err(AuthError::RegistryUnavailable)
            }
        }
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let read = async {
            redis::cmd("EXISTS")
                .arg(Self::key(jti))
                .query_async::<_, bool>(&mut conn)
                .await
        };

        match timeout(REGISTRY_TIMEOUT, read).await {
            Ok(Ok(exists)) => Ok(exists),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "revocation lookup failed");
                Err(AuthError::RegistryUnavailable)
            }
            Err(_) => {
                tracing::error!("revocation lookup timed out");
                Err(AuthError::RegistryUnavailable)
            }
        }
    }
}

/// In-memory registry for tests and local development. Entries expire by
/// deadline on lookup; `set_unavailable` simulates a registry outage.
#[derive(Default)]
pub struct MemoryRevocationRegistry {
    entries: Mutex<HashMap<String, Instant>>,
    unavailable: AtomicBool,
}

impl MemoryRevocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(AuthError::RegistryUnavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RevocationRegistry for MemoryRevocationRegistry {
    async fn revoke(&self, jti: &str, remaining_ttl_secs: i64) -> Result<()> {
        self.check_available()?;
        if remaining_ttl_secs <= 0 {
            return Ok(());
        }
        let deadline = Instant::now() + Duration::from_secs(remaining_ttl_secs as u64);
        self.entries.lock().await.insert(jti.to_string(), deadline);
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool> {
        self.check_available()?;
        let mut entries = self.entries.lock().await;
        match entries.get(jti) {
            Some(deadline) if *deadline > Instant::now() => Ok(true),
            Some(_) => {
                entries.remove(jti);
                Ok(false)
            }
            None => Ok(false),
        }
    }
}
