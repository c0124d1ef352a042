/// Administrative endpoints
///
/// # Endpoints
///
/// - `POST /admin/cleanup-tokens` - Evict expired revocation entries now

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::AuthContext,
};
use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role required for admin endpoints
pub const ADMIN_ROLE: &str = "ADMIN";

/// Cleanup response
#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub cleaned_tokens: u64,
}

/// Runs one revocation cleanup pass
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token (from the auth layer)
/// - `403 Forbidden`: Caller lacks the ADMIN role
/// - `503 Service Unavailable`: Revocation store unreachable
pub async fn cleanup_tokens(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<CleanupResponse>> {
    if !auth.has_role(ADMIN_ROLE) {
        tracing::warn!(
            username = %auth.claims.username,
            user_id = auth.claims.sub,
            "Cleanup requested without admin role"
        );
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }

    let cleaned = state.auth.cleanup().await?;

    tracing::info!(
        username = %auth.claims.username,
        cleaned_tokens = cleaned,
        "Manual revocation cleanup"
    );

    Ok(Json(CleanupResponse {
        message: format!("Cleaned up {} expired tokens", cleaned),
        timestamp: state.auth.now(),
        cleaned_tokens: cleaned,
    }))
}
