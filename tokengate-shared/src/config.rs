/// Authentication configuration
///
/// Loaded from environment variables (a `.env` file is read first when
/// present). Shared by the API server and the cleanup worker.
///
/// # Environment Variables
///
/// - `JWT_SECRET_KEY`: signing secret, at least 32 characters (required)
/// - `JWT_ALGORITHM`: optional; only `HS256` is accepted
/// - `JWT_EXPIRE_HOURS`: token lifetime, at most 100 years (default: 24)
/// - `JWT_LEEWAY_SECONDS`: expiry grace, at most one day (default: 0)
/// - `PASSWORD_HASH_SCHEME`: `bcrypt` or `argon2id` (default: bcrypt)
/// - `BCRYPT_COST`: bcrypt cost (default: 10)
/// - `ARGON2_MEMORY_KIB` / `ARGON2_ITERATIONS` / `ARGON2_PARALLELISM`
/// - `DEFAULT_ROLES`: comma-separated roles for accounts without any (default: USER)
/// - `STORE_TIMEOUT_MS`: bound on every store call (default: 2000)
/// - `REVOCATION_BACKEND`: `postgres`, `redis` or `memory` (default: postgres)
/// - `CLEANUP_INTERVAL_SECS`: revocation eviction period (default: 3600)
/// - `DATABASE_URL`: PostgreSQL connection string
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `REDIS_URL`: Redis connection string (required for the redis backend)
///
/// # Example
///
/// ```no_run
/// use tokengate_shared::config::AuthConfig;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AuthConfig::from_env()?;
/// println!("tokens live for {} hours", config.token_ttl_hours);
/// # Ok(())
/// # }
/// ```

use crate::auth::password::{HashScheme, PasswordConfig};
use crate::auth::service::AuthServiceConfig;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Minimum accepted signing secret length
pub const MIN_SECRET_LENGTH: usize = 32;

/// Longest accepted token lifetime (100 years)
pub const MAX_TOKEN_TTL_HOURS: i64 = 8760 * 100;

/// Largest accepted expiry grace (one day)
pub const MAX_LEEWAY_SECONDS: i64 = 86_400;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required variable not set
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    /// Variable set but unusable
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Where revocation entries are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationBackend {
    Postgres,
    Redis,
    Memory,
}

impl FromStr for RevocationBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(RevocationBackend::Postgres),
            "redis" => Ok(RevocationBackend::Redis),
            "memory" => Ok(RevocationBackend::Memory),
            other => Err(format!("unknown revocation backend '{}'", other)),
        }
    }
}

/// Authentication settings
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: String,

    /// Token lifetime in hours
    pub token_ttl_hours: i64,

    /// Expiry grace in seconds
    pub leeway_seconds: i64,

    /// Scheme and cost for new password hashes
    pub password: PasswordConfig,

    /// Roles for accounts that have none
    pub default_roles: Vec<String>,

    /// Bound on every store call, in milliseconds
    pub store_timeout_ms: u64,

    pub revocation_backend: RevocationBackend,

    /// Eviction period for the cleanup job
    pub cleanup_interval_secs: u64,

    pub database_url: Option<String>,

    pub database_max_connections: u32,

    pub redis_url: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("leeway_seconds", &self.leeway_seconds)
            .field("password", &self.password)
            .field("default_roles", &self.default_roles)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .field("revocation_backend", &self.revocation_backend)
            .field("cleanup_interval_secs", &self.cleanup_interval_secs)
            .field("database_configured", &self.database_url.is_some())
            .field("redis_configured", &self.redis_url.is_some())
            .finish()
    }
}

impl AuthConfig {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or any value is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or any value is invalid
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET_KEY").ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;
        if jwt_secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET_KEY",
                reason: format!("must be at least {} characters long", MIN_SECRET_LENGTH),
            });
        }

        if let Some(algorithm) = lookup("JWT_ALGORITHM") {
            if !algorithm.trim().eq_ignore_ascii_case("HS256") {
                return Err(ConfigError::Invalid {
                    key: "JWT_ALGORITHM",
                    reason: format!("only HS256 is supported, got '{}'", algorithm),
                });
            }
        }

        let token_ttl_hours: i64 = parse_or(&lookup, "JWT_EXPIRE_HOURS", 24)?;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            return Err(ConfigError::Invalid {
                key: "JWT_EXPIRE_HOURS",
                reason: format!("must be between 1 and {}", MAX_TOKEN_TTL_HOURS),
            });
        }

        let leeway_seconds: i64 = parse_or(&lookup, "JWT_LEEWAY_SECONDS", 0)?;
        if !(0..=MAX_LEEWAY_SECONDS).contains(&leeway_seconds) {
            return Err(ConfigError::Invalid {
                key: "JWT_LEEWAY_SECONDS",
                reason: format!("must be between 0 and {}", MAX_LEEWAY_SECONDS),
            });
        }

        let password = Self::password_config(&lookup)?;

        let default_roles: Vec<String> = lookup("DEFAULT_ROLES")
            .unwrap_or_else(|| "USER".to_string())
            .split(',')
            .map(|role| role.trim().to_string())
            .filter(|role| !role.is_empty())
            .collect();

        let store_timeout_ms: u64 = parse_or(&lookup, "STORE_TIMEOUT_MS", 2000)?;
        if store_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "STORE_TIMEOUT_MS",
                reason: "must be positive".to_string(),
            });
        }

        let revocation_backend = match lookup("REVOCATION_BACKEND") {
            Some(value) => value.parse().map_err(|reason| ConfigError::Invalid {
                key: "REVOCATION_BACKEND",
                reason,
            })?,
            None => RevocationBackend::Postgres,
        };

        let cleanup_interval_secs: u64 = parse_or(&lookup, "CLEANUP_INTERVAL_SECS", 3600)?;
        if cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "CLEANUP_INTERVAL_SECS",
                reason: "must be positive".to_string(),
            });
        }

        let database_url = lookup("DATABASE_URL");
        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;
        let redis_url = lookup("REDIS_URL");

        if revocation_backend == RevocationBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if revocation_backend == RevocationBackend::Redis && redis_url.is_none() {
            return Err(ConfigError::Missing("REDIS_URL"));
        }

        Ok(Self {
            jwt_secret,
            token_ttl_hours,
            leeway_seconds,
            password,
            default_roles,
            store_timeout_ms,
            revocation_backend,
            cleanup_interval_secs,
            database_url,
            database_max_connections,
            redis_url,
        })
    }

    fn password_config<F>(lookup: &F) -> Result<PasswordConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let scheme = match lookup("PASSWORD_HASH_SCHEME") {
            Some(value) => value.parse::<HashScheme>().map_err(|e| ConfigError::Invalid {
                key: "PASSWORD_HASH_SCHEME",
                reason: e.to_string(),
            })?,
            None => HashScheme::Bcrypt,
        };

        let defaults = PasswordConfig::default();

        Ok(PasswordConfig {
            scheme,
            bcrypt_cost: parse_or(lookup, "BCRYPT_COST", defaults.bcrypt_cost)?,
            argon2_memory_kib: parse_or(lookup, "ARGON2_MEMORY_KIB", defaults.argon2_memory_kib)?,
            argon2_iterations: parse_or(lookup, "ARGON2_ITERATIONS", defaults.argon2_iterations)?,
            argon2_parallelism: parse_or(lookup, "ARGON2_PARALLELISM", defaults.argon2_parallelism)?,
        })
    }

    /// Settings for [`AuthService`](crate::auth::service::AuthService)
    pub fn service_config(&self) -> AuthServiceConfig {
        AuthServiceConfig {
            token_ttl: chrono::Duration::hours(self.token_ttl_hours),
            default_roles: self.default_roles.clone(),
            store_timeout: std::time::Duration::from_millis(self.store_timeout_ms),
        }
    }

    /// Cleanup job period
    pub fn cleanup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cleanup_interval_secs)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
