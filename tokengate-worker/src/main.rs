//! # Tokengate Worker
//!
//! Runs the revocation cleanup job on its own, for deployments where the API
//! servers should not do maintenance work.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p tokengate-worker
//! ```

use tokengate_shared::{bootstrap, config::AuthConfig, db::pool::close_pool};
use tokengate_worker::CleanupJob;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "Tokengate Worker v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = AuthConfig::from_env()?;
    let runtime = bootstrap::connect(&config, false).await?;

    let shutdown = CancellationToken::new();
    let job = CleanupJob::new(runtime.service.clone(), config.cleanup_interval());
    let handle = job.spawn(shutdown.clone());

    tracing::info!(interval_secs = job.interval().as_secs(), "Worker ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping cleanup job...");

    shutdown.cancel();
    let evicted = handle.await?;
    tracing::info!(total_evicted = evicted, "Cleanup job stopped");

    if let Some(pool) = runtime.pool {
        close_pool(pool).await;
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tokengate_worker=debug,tokengate_shared=info".into());

    let json = std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
