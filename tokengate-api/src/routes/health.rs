/// Service descriptor and health check
///
/// # Endpoints
///
/// - `GET /` - service name, version and endpoint list
/// - `GET /health` - status plus database connectivity
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "service": "tokengate",
///   "version": "0.1.0",
///   "timestamp": "2025-07-22T10:30:00Z",
///   "database": "connected"
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokengate_shared::db::pool::health_check as db_health_check;

/// Service name reported by `/` and `/health`
pub const SERVICE_NAME: &str = "tokengate";

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`
    pub status: String,

    pub service: String,

    /// Application version
    pub version: String,

    pub timestamp: DateTime<Utc>,

    /// `connected`, `disconnected` or `not_configured`
    pub database: String,
}

/// Service descriptor
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub description: String,
    pub endpoints: BTreeMap<String, String>,
}

/// Health check handler
///
/// Unhealthy only when a configured database cannot be reached.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_status = match &state.db {
        Some(pool) => match db_health_check(pool).await {
            Ok(()) => "connected",
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                "disconnected"
            }
        },
        None => "not_configured",
    };

    Json(HealthResponse {
        status: if database_status == "disconnected" {
            "unhealthy".to_string()
        } else {
            "healthy".to_string()
        },
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: state.auth.now(),
        database: database_status.to_string(),
    })
}

/// Root handler
pub async fn service_info() -> Json<ServiceInfo> {
    let endpoints = [
        ("login", "/user-management/login"),
        ("logout", "/user-management/logout"),
        ("me", "/user-management/me"),
        ("cleanup", "/admin/cleanup-tokens"),
        ("health", "/health"),
    ]
    .into_iter()
    .map(|(name, path)| (name.to_string(), path.to_string()))
    .collect();

    Json(ServiceInfo {
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Token-based authentication service".to_string(),
        endpoints,
    })
}
