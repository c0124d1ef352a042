/// Redis revocation store
///
/// All entries live in one sorted set: member = token fingerprint,
/// score = expiry (unix seconds).
///
/// ```text
/// revoke       ZADD key NX <exp> <fingerprint>
/// is_revoked   ZSCORE key <fingerprint>
/// evict        ZREMRANGEBYSCORE key -inf <now>
/// ```
///
/// `ZREMRANGEBYSCORE` is atomic, so concurrent evictions never count the same
/// member twice. `revoked_at` is not kept in this backend.

use super::{token_fingerprint, RevocationError, RevocationStore};
use crate::redis::client::RedisClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Default sorted-set key
pub const DEFAULT_REVOCATION_KEY: &str = "tokengate:revoked";

/// Revocation store backed by a Redis sorted set
#[derive(Clone)]
pub struct RedisRevocationStore {
    client: RedisClient,
    key: String,
}

impl std::fmt::Debug for RedisRevocationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRevocationStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl RedisRevocationStore {
    /// Creates a store using [`DEFAULT_REVOCATION_KEY`]
    pub fn new(client: RedisClient) -> Self {
        Self::with_key(client, DEFAULT_REVOCATION_KEY)
    }

    /// Creates a store using a custom sorted-set key
    pub fn with_key(client: RedisClient, key: impl Into<String>) -> Self {
        Self {
            client,
            key: key.into(),
        }
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), RevocationError> {
        let mut conn = self.client.get_connection();

        let _added: i64 = ::redis::cmd("ZADD")
            .arg(&self.key)
            .arg("NX")
            .arg(expires_at.timestamp())
            .arg(token_fingerprint(token))
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError> {
        let mut conn = self.client.get_connection();

        let score: Option<f64> = ::redis::cmd("ZSCORE")
            .arg(&self.key)
            .arg(token_fingerprint(token))
            .query_async(&mut conn)
            .await?;

        Ok(score.is_some())
    }

    async fn evict_expired(&self, now: DateTime<Utc>) -> Result<u64, RevocationError> {
        let mut conn = self.client.get_connection();

        let removed: u64 = ::redis::cmd("ZREMRANGEBYSCORE")
            .arg(&self.key)
            .arg("-inf")
            .arg(now.timestamp())
            .query_async(&mut conn)
            .await?;

        Ok(removed)
    }
}
