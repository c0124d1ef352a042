/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /user-management/login` - Credentials to bearer token
/// - `POST /user-management/logout` - Revoke the bearer token
/// - `GET /user-management/me` - Claims of the bearer token

use crate::{
    app::AppState,
    error::ApiResult,
    middleware::auth::{bearer_token, AuthContext},
};
use axum::{extract::State, http::HeaderMap, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// 3 to 50 characters once surrounding whitespace is removed
    #[validate(custom(function = "validate_username"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    let length = username.trim().chars().count();
    if (3..=50).contains(&length) {
        Ok(())
    } else {
        let mut error = ValidationError::new("length");
        error.message = Some("Username must be between 3 and 50 characters".into());
        Err(error)
    }
}

/// Identity echoed back on login
#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub roles: Vec<String>,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Signed access token
    pub token: String,

    /// Always "Bearer"
    pub token_type: String,

    /// Seconds until the token expires
    pub expires_in: i64,

    pub issued_at: DateTime<Utc>,

    pub user: UserInfo,
}

/// Logout response
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Current identity
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub roles: Vec<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /user-management/login
/// Content-Type: application/json
///
/// { "username": "admin", "password": "admin123" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "token": "eyJ...",
///   "tokenType": "Bearer",
///   "expiresIn": 86400,
///   "issuedAt": "2025-07-22T10:30:00Z",
///   "user": { "id": 1, "username": "admin", "roles": ["ADMIN", "USER"] }
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid username or password (also for disabled accounts)
/// - `422 Unprocessable Entity`: Validation failed
/// - `503 Service Unavailable`: User store unreachable
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let username = req.username.trim();
    tracing::info!(username = %username, "Login attempt");

    let session = state.auth.authenticate(username, &req.password).await?;

    Ok(Json(LoginResponse {
        token: session.token,
        token_type: session.token_type.to_string(),
        expires_in: session.expires_in,
        issued_at: session.issued_at,
        user: UserInfo {
            id: session.claims.sub,
            username: session.claims.username,
            roles: session.claims.roles,
        },
    }))
}

/// Logout endpoint
///
/// Revokes the bearer token until its natural expiry. Logging out twice, or
/// with a token that has already expired, succeeds.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing header, or a token that is not correctly signed
/// - `503 Service Unavailable`: Revocation store unreachable
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<LogoutResponse>> {
    let token = bearer_token(&headers)?;
    let receipt = state.auth.logout(token).await?;

    Ok(Json(LogoutResponse {
        message: "Logout successful".to_string(),
        timestamp: receipt.logged_out_at,
    }))
}

/// Returns the verified claims of the caller
pub async fn me(Extension(auth): Extension<AuthContext>) -> Json<MeResponse> {
    let claims = auth.claims;

    Json(MeResponse {
        id: claims.sub,
        issued_at: claims.issued_at(),
        expires_at: claims.expires_at(),
        username: claims.username,
        roles: claims.roles,
    })
}
