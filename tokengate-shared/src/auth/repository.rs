/// User lookup for authentication
///
/// The service only ever reads accounts, by username. Implementations:
///
/// - [`PgUserRepository`]: the `users` / `user_roles` tables
/// - [`InMemoryUserRepository`]: a map, for tests and local runs

use crate::models::user::{CreateUser, UserRecord};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

/// Error type for user lookups
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Backing store unreachable or the query failed
    #[error("User store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Unavailable(err.to_string())
    }
}

/// Read access to user accounts
#[async_trait]
pub trait UserRepository: Send + Sync + std::fmt::Debug {
    /// Finds an account by exact username
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepositoryError>;
}

/// Repository over the Postgres `users` table
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Creates a repository using an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepositoryError> {
        Ok(UserRecord::find_by_username(&self.pool, username).await?)
    }
}

/// In-process repository keyed by username
#[derive(Debug)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, UserRecord>>,
    next_id: AtomicI64,
}

impl InMemoryUserRepository {
    /// Creates an empty repository
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Adds an account, assigning the next id
    ///
    /// Replaces any existing account with the same username.
    pub async fn insert(&self, data: CreateUser) -> UserRecord {
        let mut roles = data.roles;
        roles.sort();
        roles.dedup();

        let record = UserRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            username: data.username,
            password_hash: data.password_hash,
            enabled: data.enabled,
            roles,
        };

        self.users
            .write()
            .await
            .insert(record.username.clone(), record.clone());
        record
    }

    /// Enables or disables an account; returns `false` if it doesn't exist
    pub async fn set_enabled(&self, username: &str, enabled: bool) -> bool {
        match self.users.write().await.get_mut(username) {
            Some(user) => {
                user.enabled = enabled;
                true
            }
            None => false,
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepositoryError> {
        Ok(self.users.read().await.get(username).cloned())
    }
}
