/// Redis integration
///
/// Connection management for the Redis-backed revocation store
/// ([`crate::revocation::redis`]).
///
/// # Example
///
/// ```no_run
/// use tokengate_shared::redis::client::{RedisClient, RedisConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RedisConfig {
///     url: "redis://localhost:6379".to_string(),
///     command_timeout_secs: 5,
/// };
/// let client = RedisClient::new(config).await?;
///
/// let healthy = client.ping().await?;
/// println!("Redis healthy: {}", healthy);
/// # Ok(())
/// # }
/// ```

pub mod client;

pub use client::{RedisClient, RedisClientError, RedisConfig};
