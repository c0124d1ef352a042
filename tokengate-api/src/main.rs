//! # Tokengate API Server
//!
//! HTTP front end for the authentication core: login, logout, token
//! verification and revocation maintenance.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p tokengate-api
//! ```

use tokengate_api::{
    app::{build_router, AppState},
    config::Config,
};
use tokengate_shared::{bootstrap, db::pool::close_pool};
use tokengate_worker::CleanupJob;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "Tokengate API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let runtime = bootstrap::connect(&config.auth, true).await?;

    let shutdown = CancellationToken::new();
    let cleanup_handle = if config.api.run_cleanup_job {
        let job = CleanupJob::new(runtime.service.clone(), config.auth.cleanup_interval());
        Some(job.spawn(shutdown.clone()))
    } else {
        tracing::info!("In-process cleanup job disabled");
        None
    };

    let bind_address = config.bind_address();
    let state = AppState::new(runtime.service.clone(), runtime.pool.clone(), config.api);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    if let Some(handle) = cleanup_handle {
        handle.await?;
    }

    if let Some(pool) = runtime.pool {
        close_pool(pool).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received, draining connections...");
    shutdown.cancel();
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tokengate_api=debug,tokengate_shared=info,tower_http=debug".into());

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
