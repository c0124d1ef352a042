/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use tokengate_api::{app::{build_router, AppState}, config::Config};
/// use tokengate_shared::bootstrap;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let runtime = bootstrap::connect(&config.auth, true).await?;
/// let state = AppState::new(runtime.service, runtime.pool, config.api);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::ApiConfig, middleware::auth::require_auth, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tokengate_shared::auth::AuthService;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<AuthService>,

    /// Database pool, when one is configured
    pub db: Option<PgPool>,

    /// Server configuration
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Creates new application state
    pub fn new(auth: Arc<AuthService>, db: Option<PgPool>, config: ApiConfig) -> Self {
        Self {
            auth,
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /                          # Service descriptor (public)
/// ├── GET  /health                    # Health check (public)
/// ├── /user-management/
/// │   ├── POST /login                 # Credentials to token (public)
/// │   ├── POST /logout                # Revoke the bearer token
/// │   └── GET  /me                    # Verified claims (authenticated)
/// └── /admin/
///     └── POST /cleanup-tokens        # Evict expired revocations (ADMIN)
/// ```
///
/// Logout reads the bearer token itself rather than going through
/// [`require_auth`], so an expired or already revoked token can still log out.
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(routes::health::service_info))
        .route("/health", get(routes::health::health_check))
        .route("/user-management/login", post(routes::auth::login))
        .route("/user-management/logout", post(routes::auth::logout));

    let protected_routes = Router::new()
        .route("/user-management/me", get(routes::auth::me))
        .route("/admin/cleanup-tokens", post(routes::admin::cleanup_tokens))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let cors = if state.config.allows_any_origin() {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
