/// In-process revocation store
///
/// A single `RwLock`ed map. Insert, lookup and eviction each hold the lock
/// for one map operation only; eviction runs under the write lock so every
/// entry is removed by exactly one caller.

use super::{token_fingerprint, RevocationEntry, RevocationError, RevocationStore};
use crate::auth::clock::{Clock, SystemClock};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory revocation store
#[derive(Debug)]
pub struct InMemoryRevocationStore {
    entries: RwLock<HashMap<String, RevocationEntry>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryRevocationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRevocationStore {
    /// Creates an empty store stamping `revoked_at` from the wall clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store stamping `revoked_at` from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of entries currently held
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Looks up the entry for a token
    pub async fn entry(&self, token: &str) -> Option<RevocationEntry> {
        self.entries
            .read()
            .await
            .get(&token_fingerprint(token))
            .cloned()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), RevocationError> {
        let token_hash = token_fingerprint(token);
        let revoked_at = self.clock.now();
        let mut entries = self.entries.write().await;

        entries
            .entry(token_hash.clone())
            .or_insert_with(|| RevocationEntry {
                token_hash,
                expires_at,
                revoked_at,
            });

        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError> {
        Ok(self
            .entries
            .read()
            .await
            .contains_key(&token_fingerprint(token)))
    }

    async fn evict_expired(&self, now: DateTime<Utc>) -> Result<u64, RevocationError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        Ok((before - entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_revoke_then_is_revoked() {
        let store = InMemoryRevocationStore::new();
        store.revoke("token-a", at(100)).await.unwrap();

        assert!(store.is_revoked("token-a").await.unwrap());
        assert!(!store.is_revoked("token-b").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let store = InMemoryRevocationStore::new();
        store.revoke("token-a", at(100)).await.unwrap();
        let first = store.entry("token-a").await.unwrap();

        store.revoke("token-a", at(100)).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.entry("token-a").await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_entry_is_keyed_by_fingerprint() {
        let store = InMemoryRevocationStore::new();
        store.revoke("token-a", at(100)).await.unwrap();

        let entry = store.entry("token-a").await.unwrap();
        assert_eq!(entry.token_hash, token_fingerprint("token-a"));
        assert_eq!(entry.expires_at, at(100));
    }

    #[tokio::test]
    async fn test_revoked_at_comes_from_clock() {
        let clock = Arc::new(ManualClock::new(at(0)));
        let store = InMemoryRevocationStore::with_clock(clock.clone());

        clock.advance(chrono::Duration::seconds(30));
        store.revoke("token-a", at(100)).await.unwrap();

        // A second revoke keeps the original stamp
        clock.advance(chrono::Duration::seconds(30));
        store.revoke("token-a", at(100)).await.unwrap();

        assert_eq!(store.entry("token-a").await.unwrap().revoked_at, at(30));
    }

    #[tokio::test]
    async fn test_evict_expired_boundary() {
        let store = InMemoryRevocationStore::new();
        store.revoke("past", at(50)).await.unwrap();
        store.revoke("boundary", at(100)).await.unwrap();
        store.revoke("future", at(101)).await.unwrap();

        assert_eq!(store.evict_expired(at(100)).await.unwrap(), 2);
        assert!(!store.is_revoked("past").await.unwrap());
        assert!(!store.is_revoked("boundary").await.unwrap());
        assert!(store.is_revoked("future").await.unwrap());

        assert_eq!(store.evict_expired(at(100)).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_revoke_same_and_distinct_tokens() {
        let store = Arc::new(InMemoryRevocationStore::new());
        let mut handles = Vec::new();

        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.revoke("shared", at(10)).await.unwrap();
                store.revoke(&format!("token-{}", i), at(10 + i)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len().await, 51);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_eviction_counts_each_entry_once() {
        let store = Arc::new(InMemoryRevocationStore::new());
        for i in 0..200 {
            store.revoke(&format!("token-{}", i), at(i)).await.unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.evict_expired(at(99)).await.unwrap()
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }

        assert_eq!(total, 100);
        assert_eq!(store.len().await, 100);
        assert!(store.is_revoked("token-150").await.unwrap());
        assert_eq!(store.evict_expired(at(99)).await.unwrap(), 0);
    }
}
