/// Authentication service
///
/// Ties the user repository, password hasher, token codec and revocation store
/// together. Holds no mutable state of its own; every collaborator is passed in
/// at construction, so independent instances can run side by side.
///
/// # Operations
///
/// - [`AuthService::authenticate`]: credentials to signed token
/// - [`AuthService::verify`]: token to claims (revocation checked first)
/// - [`AuthService::logout`]: revoke a token until its natural expiry
/// - [`AuthService::cleanup`]: evict revocation entries past expiry
///
/// Every store call is bounded by `store_timeout`. A timeout or store error is
/// `AuthError::StoreUnavailable`, so a revocation check that cannot complete
/// rejects the token.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tokengate_shared::auth::clock::SystemClock;
/// use tokengate_shared::auth::jwt::TokenCodec;
/// use tokengate_shared::auth::password::{PasswordConfig, PasswordHasher};
/// use tokengate_shared::auth::repository::InMemoryUserRepository;
/// use tokengate_shared::auth::service::{AuthService, AuthServiceConfig};
/// use tokengate_shared::revocation::InMemoryRevocationStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = AuthService::new(
///     Arc::new(InMemoryUserRepository::new()),
///     Arc::new(InMemoryRevocationStore::new()),
///     PasswordHasher::new(PasswordConfig::default())?,
///     TokenCodec::new(b"a-secret-of-at-least-thirty-two-bytes", Arc::new(SystemClock))?,
///     AuthServiceConfig::default(),
/// );
///
/// let session = service.authenticate("admin", "admin123").await?;
/// let claims = service.verify(&session.token).await?;
/// service.logout(&session.token).await?;
/// # Ok(())
/// # }
/// ```

use crate::auth::error::AuthError;
use crate::auth::jwt::{Claims, TokenCodec};
use crate::auth::password::PasswordHasher;
use crate::auth::repository::UserRepository;
use crate::revocation::{token_log_id, RevocationStore};
use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Token type reported alongside every issued token
pub const TOKEN_TYPE: &str = "Bearer";

/// Service tuning
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    /// Validity of issued tokens
    pub token_ttl: Duration,

    /// Roles placed in claims when the account has none
    pub default_roles: Vec<String>,

    /// Upper bound on every repository or revocation store call
    pub store_timeout: std::time::Duration,
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            token_ttl: Duration::hours(24),
            default_roles: vec!["USER".to_string()],
            store_timeout: std::time::Duration::from_millis(2000),
        }
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    /// Signed token
    pub token: String,

    /// Always [`TOKEN_TYPE`]
    pub token_type: &'static str,

    /// Seconds until expiry, from issuance
    pub expires_in: i64,

    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,

    /// Claims signed into `token`
    pub claims: Claims,
}

/// Confirmation of a logout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoutReceipt {
    pub logged_out_at: DateTime<Utc>,
}

/// Authentication service
#[derive(Debug, Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    revocations: Arc<dyn RevocationStore>,
    hasher: PasswordHasher,
    codec: TokenCodec,
    config: AuthServiceConfig,
}

impl AuthService {
    /// Creates a service from its collaborators
    pub fn new(
        users: Arc<dyn UserRepository>,
        revocations: Arc<dyn RevocationStore>,
        hasher: PasswordHasher,
        codec: TokenCodec,
        config: AuthServiceConfig,
    ) -> Self {
        Self {
            users,
            revocations,
            hasher,
            codec,
            config,
        }
    }

    /// Gets the service configuration
    pub fn config(&self) -> &AuthServiceConfig {
        &self.config
    }

    /// Current time according to the service clock
    pub fn now(&self) -> DateTime<Utc> {
        self.codec.clock().now()
    }

    /// Hashes a password with the configured scheme
    ///
    /// For provisioning accounts; runs on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if hashing fails
    pub async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("hashing task failed: {}", e)))?
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Checks credentials and issues a token
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` for an unknown user or a wrong password
    /// - `AccountDisabled` for a disabled account
    /// - `StoreUnavailable` if the user lookup fails or times out
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedSession, AuthError> {
        let user = self
            .bounded("find_by_username", self.users.find_by_username(username))
            .await?;

        let user = match user {
            Some(user) => user,
            None => {
                self.check_password(password, None).await?;
                warn!(username = %username, "Login failed: unknown user");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !user.enabled {
            self.check_password(password, None).await?;
            warn!(username = %username, user_id = user.id, "Login failed: account disabled");
            return Err(AuthError::AccountDisabled);
        }

        if !self.check_password(password, Some(user.password_hash.clone())).await? {
            warn!(username = %username, user_id = user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if self.hasher.needs_rehash(&user.password_hash) {
            debug!(user_id = user.id, "Stored password hash uses different parameters than configured");
        }

        let roles = if user.roles.is_empty() {
            self.config.default_roles.clone()
        } else {
            user.roles
        };

        let issued = self
            .codec
            .encode(user.id, &user.username, &roles, self.config.token_ttl)?;
        let claims = issued.claims;

        info!(
            username = %claims.username,
            user_id = claims.sub,
            token_id = %token_log_id(&issued.token),
            "User authenticated"
        );

        Ok(AuthenticatedSession {
            token_type: TOKEN_TYPE,
            expires_in: claims.exp - claims.iat,
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
            token: issued.token,
            claims,
        })
    }

    /// Verifies a token and returns its claims
    ///
    /// The revocation store is consulted before the token is decoded.
    ///
    /// # Errors
    ///
    /// - `Revoked` if the token was logged out
    /// - `InvalidToken` / `Expired` from decoding
    /// - `StoreUnavailable` if revocation status cannot be determined
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let revoked = self
            .bounded("is_revoked", self.revocations.is_revoked(token))
            .await?;

        if revoked {
            debug!(token_id = %token_log_id(token), "Rejected revoked token");
            return Err(AuthError::Revoked);
        }

        self.codec.decode(token).map_err(|e| {
            debug!(token_id = %token_log_id(token), error = %e, "Token verification failed");
            AuthError::from(e)
        })
    }

    /// Revokes a token until its natural expiry
    ///
    /// Idempotent. A correctly signed token that is already expired needs no
    /// entry and succeeds immediately.
    ///
    /// # Errors
    ///
    /// - `InvalidToken` if the signature or structure is bad
    /// - `StoreUnavailable` if the revocation cannot be recorded
    /// - `Internal` if expiry plus leeway is not representable
    pub async fn logout(&self, token: &str) -> Result<LogoutReceipt, AuthError> {
        let token_id = token_log_id(token);

        let claims = self.codec.decode_ignoring_expiry(token).map_err(|e| {
            warn!(token_id = %token_id, error = %e, "Logout with undecodable token");
            AuthError::from(e)
        })?;

        let now = self.now();
        let leeway = self.codec.leeway_seconds();

        if claims.is_expired_at(now, leeway) {
            debug!(token_id = %token_id, user_id = claims.sub, "Logout of already-expired token");
            return Ok(LogoutReceipt { logged_out_at: now });
        }

        // Keep the entry for as long as decode would still accept the token
        let expires_at = Duration::try_seconds(leeway)
            .and_then(|grace| claims.expires_at().checked_add_signed(grace))
            .ok_or_else(|| {
                AuthError::Internal(format!("leeway of {}s overflows token expiry", leeway))
            })?;
        self.bounded("revoke", self.revocations.revoke(token, expires_at))
            .await?;

        info!(
            username = %claims.username,
            user_id = claims.sub,
            token_id = %token_id,
            "User logged out"
        );

        Ok(LogoutReceipt { logged_out_at: now })
    }

    /// Evicts revocation entries whose expiry has passed
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the store fails or times out
    pub async fn cleanup(&self) -> Result<u64, AuthError> {
        let now = self.now();
        let removed = self
            .bounded("evict_expired", self.revocations.evict_expired(now))
            .await?;

        if removed > 0 {
            info!(removed, "Evicted expired revocation entries");
        } else {
            debug!("No expired revocation entries");
        }

        Ok(removed)
    }

    /// Verifies a password on the blocking pool
    ///
    /// With no stored hash, verifies against the placeholder and returns false.
    async fn check_password(&self, password: &str, hash: Option<String>) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || match hash {
            Some(hash) => hasher.verify(&password, &hash),
            None => {
                hasher.verify_dummy(&password);
                false
            }
        })
        .await
        .map_err(|e| AuthError::Internal(format!("password verification task failed: {}", e)))
    }

    /// Runs a store call under `store_timeout`
    async fn bounded<T, E, F>(&self, operation: &'static str, call: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<AuthError>,
    {
        match tokio::time::timeout(self.config.store_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                let err = e.into();
                error!(operation, error = %err, "Store call failed");
                Err(err)
            }
            Err(_) => {
                error!(
                    operation,
                    timeout_ms = self.config.store_timeout.as_millis() as u64,
                    "Store call timed out"
                );
                Err(AuthError::StoreUnavailable(format!("{} timed out", operation)))
            }
        }
    }
}
