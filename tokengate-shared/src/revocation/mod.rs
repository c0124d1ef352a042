/// Token revocation (denylist) storage
///
/// Signed tokens cannot be recalled once issued, so logout records the token
/// here until its natural expiry. Verification consults the store before
/// accepting a token.
///
/// # Backends
///
/// - [`memory`]: in-process map, for tests and single-node deployments
/// - [`postgres`]: `token_blacklist` table
/// - [`redis`]: one sorted set scored by expiry
///
/// # Invariants
///
/// - Entries are keyed by [`token_fingerprint`], never the raw token
/// - An entry's `expires_at` is the `exp` claim of the token it revokes, plus
///   any decode leeway
/// - `revoke` is idempotent
/// - `evict_expired(now)` removes exactly the entries with `expires_at <= now`,
///   each one exactly once even under concurrent eviction
///
/// # Example
///
/// ```
/// use tokengate_shared::revocation::{memory::InMemoryRevocationStore, RevocationStore};
/// use chrono::{Duration, Utc};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryRevocationStore::new();
/// let expires_at = Utc::now() + Duration::hours(1);
///
/// store.revoke("header.claims.signature", expires_at).await?;
/// assert!(store.is_revoked("header.claims.signature").await?);
/// assert_eq!(store.evict_expired(expires_at).await?, 1);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod memory;
pub mod postgres;
pub mod redis;

pub use memory::InMemoryRevocationStore;
pub use postgres::PgRevocationStore;
pub use self::redis::RedisRevocationStore;

/// Error type for revocation storage
///
/// Any of these means revocation status could not be determined; callers
/// must treat that as "reject", never as "not revoked".
#[derive(Debug, thiserror::Error)]
pub enum RevocationError {
    /// Backing store unreachable or failed the command
    #[error("Revocation store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for RevocationError {
    fn from(err: sqlx::Error) -> Self {
        RevocationError::Unavailable(format!("Database error: {}", err))
    }
}

impl From<::redis::RedisError> for RevocationError {
    fn from(err: ::redis::RedisError) -> Self {
        RevocationError::Unavailable(format!("Redis error: {}", err))
    }
}

/// A revoked token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationEntry {
    /// SHA-256 fingerprint of the token
    pub token_hash: String,

    /// The token's own `exp`; the entry is useless after this instant
    pub expires_at: DateTime<Utc>,

    /// When the token was revoked
    pub revoked_at: DateTime<Utc>,
}

/// Storage trait for revoked tokens
///
/// Implementations must give read-your-writes consistency: a `revoke` that
/// returned before an `is_revoked` call starts must be visible to it.
#[async_trait]
pub trait RevocationStore: Send + Sync + std::fmt::Debug {
    /// Marks a token as revoked until `expires_at`
    ///
    /// Revoking an already-revoked token is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RevocationError::Unavailable` if the store cannot be written
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), RevocationError>;

    /// Checks whether a token has been revoked
    ///
    /// # Errors
    ///
    /// Returns `RevocationError::Unavailable` if the store cannot be read
    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError>;

    /// Deletes every entry with `expires_at <= now`
    ///
    /// # Returns
    ///
    /// Number of entries this call removed
    ///
    /// # Errors
    ///
    /// Returns `RevocationError::Unavailable` if the store cannot be written
    async fn evict_expired(&self, now: DateTime<Utc>) -> Result<u64, RevocationError>;
}

/// Computes the identifier a token is stored and logged under
///
/// Lowercase hex SHA-256 of the token string (64 chars).
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Short form of [`token_fingerprint`] for log lines
pub fn token_log_id(token: &str) -> String {
    let mut fingerprint = token_fingerprint(token);
    fingerprint.truncate(16);
    fingerprint
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable_sha256_hex() {
        let a = token_fingerprint("abc");
        assert_eq!(
            a,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(a, token_fingerprint("abc"));
        assert_ne!(a, token_fingerprint("abd"));
    }

    #[test]
    fn test_log_id_is_prefix() {
        let id = token_log_id("abc");
        assert_eq!(id.len(), 16);
        assert!(token_fingerprint("abc").starts_with(&id));
    }
}
