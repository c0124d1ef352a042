/// Service construction from configuration
///
/// Opens the database pool and Redis connection the configuration asks for and
/// wires an [`AuthService`] over them. Both binaries start here.
///
/// | `REVOCATION_BACKEND` | users          | revocations       |
/// |----------------------|----------------|-------------------|
/// | `postgres`           | Postgres       | `token_blacklist` |
/// | `redis`              | Postgres       | Redis sorted set  |
/// | `memory`             | Postgres if `DATABASE_URL` is set, else in-memory | in-process map |

use crate::auth::clock::SystemClock;
use crate::auth::jwt::{TokenCodec, TokenError};
use crate::auth::password::{PasswordError, PasswordHasher};
use crate::auth::repository::{InMemoryUserRepository, PgUserRepository, UserRepository};
use crate::auth::service::AuthService;
use crate::config::{AuthConfig, ConfigError, RevocationBackend};
use crate::db::{migrations::run_migrations, pool::{create_pool, DatabaseConfig}};
use crate::redis::client::{RedisClient, RedisClientError, RedisConfig};
use crate::revocation::{
    InMemoryRevocationStore, PgRevocationStore, RedisRevocationStore, RevocationStore,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

/// Error type for startup wiring
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Redis(#[from] RedisClientError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// A wired service plus the pool it uses, if any
#[derive(Debug, Clone)]
pub struct AuthRuntime {
    pub service: Arc<AuthService>,
    pub pool: Option<PgPool>,
}

/// Connects the configured backends and builds the service
///
/// Migrations are applied when `migrate` is set and a database is configured.
///
/// # Errors
///
/// Returns an error if a backend cannot be reached or a parameter is invalid
pub async fn connect(config: &AuthConfig, migrate: bool) -> Result<AuthRuntime, BootstrapError> {
    let pool = match &config.database_url {
        Some(url) => {
            let pool = create_pool(DatabaseConfig {
                url: url.clone(),
                max_connections: config.database_max_connections,
                ..Default::default()
            })
            .await?;

            if migrate {
                run_migrations(&pool).await?;
            }
            Some(pool)
        }
        None => None,
    };

    let users: Arc<dyn UserRepository> = match &pool {
        Some(pool) => Arc::new(PgUserRepository::new(pool.clone())),
        None => {
            warn!("No DATABASE_URL configured, using an empty in-memory user repository");
            Arc::new(InMemoryUserRepository::new())
        }
    };

    let revocations: Arc<dyn RevocationStore> = match config.revocation_backend {
        RevocationBackend::Postgres => {
            let pool = pool.clone().ok_or(ConfigError::Missing("DATABASE_URL"))?;
            Arc::new(PgRevocationStore::new(pool))
        }
        RevocationBackend::Redis => {
            let url = config.redis_url.clone().ok_or(ConfigError::Missing("REDIS_URL"))?;
            let client = RedisClient::new(RedisConfig {
                url,
                command_timeout_secs: 5,
            })
            .await?;
            Arc::new(RedisRevocationStore::new(client))
        }
        RevocationBackend::Memory => {
            warn!("Revocations are held in process memory and are lost on restart");
            Arc::new(InMemoryRevocationStore::new())
        }
    };

    let hasher = PasswordHasher::new(config.password.clone())?;
    let codec = TokenCodec::new(config.jwt_secret.as_bytes(), Arc::new(SystemClock))?
        .with_leeway(config.leeway_seconds);

    info!(
        backend = ?config.revocation_backend,
        scheme = config.password.scheme.as_str(),
        token_ttl_hours = config.token_ttl_hours,
        "Authentication service configured"
    );

    Ok(AuthRuntime {
        service: Arc::new(AuthService::new(
            users,
            revocations,
            hasher,
            codec,
            config.service_config(),
        )),
        pool,
    })
}
