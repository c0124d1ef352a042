/// PostgreSQL revocation store
///
/// # Schema
///
/// ```sql
/// CREATE TABLE token_blacklist (
///     token_hash VARCHAR(64) PRIMARY KEY,
///     expires_at TIMESTAMPTZ NOT NULL,
///     revoked_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE INDEX idx_token_blacklist_expires_at ON token_blacklist (expires_at);
/// ```
///
/// Each statement checks a connection out of the pool and returns it when the
/// statement future completes or is dropped, so a timed-out call never leaks a
/// connection.

use super::{token_fingerprint, RevocationEntry, RevocationError, RevocationStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Revocation store backed by the `token_blacklist` table
#[derive(Debug, Clone)]
pub struct PgRevocationStore {
    pool: PgPool,
}

impl PgRevocationStore {
    /// Creates a store using an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Looks up the entry for a token
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried
    pub async fn entry(&self, token: &str) -> Result<Option<RevocationEntry>, RevocationError> {
        let row = sqlx::query_as::<_, (String, DateTime<Utc>, DateTime<Utc>)>(
            r#"
            SELECT token_hash, expires_at, revoked_at
            FROM token_blacklist
            WHERE token_hash = $1
            "#,
        )
        .bind(token_fingerprint(token))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(token_hash, expires_at, revoked_at)| RevocationEntry {
            token_hash,
            expires_at,
            revoked_at,
        }))
    }
}

#[async_trait]
impl RevocationStore for PgRevocationStore {
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), RevocationError> {
        sqlx::query(
            r#"
            INSERT INTO token_blacklist (token_hash, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (token_hash) DO NOTHING
            "#,
        )
        .bind(token_fingerprint(token))
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM token_blacklist WHERE token_hash = $1)",
        )
        .bind(token_fingerprint(token))
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn evict_expired(&self, now: DateTime<Utc>) -> Result<u64, RevocationError> {
        let result = sqlx::query("DELETE FROM token_blacklist WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
