/// Bearer token authentication
///
/// [`require_auth`] verifies the `Authorization: Bearer <token>` header through
/// [`AuthService::verify`](tokengate_shared::auth::AuthService::verify) and puts
/// an [`AuthContext`] into the request extensions.
///
/// # Example
///
/// ```no_run
/// use axum::{Extension, Router, routing::get};
/// use tokengate_api::app::AppState;
/// use tokengate_api::middleware::auth::{require_auth, AuthContext};
///
/// async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
///     auth.claims.username
/// }
///
/// fn routes(state: AppState) -> Router<AppState> {
///     Router::new()
///         .route("/whoami", get(whoami))
///         .layer(axum::middleware::from_fn_with_state(state, require_auth))
/// }
/// ```

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tokengate_shared::auth::jwt::Claims;

/// Verified caller identity
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Verified claims
    pub claims: Claims,
}

impl AuthContext {
    /// Whether the caller holds `role`
    pub fn has_role(&self, role: &str) -> bool {
        self.claims.has_role(role)
    }
}

/// Extracts the token from an `Authorization: Bearer` header
///
/// # Errors
///
/// - `Unauthorized` if the header is missing, empty or not a Bearer credential
/// - `BadRequest` if the header is not valid text
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| ApiError::BadRequest("Malformed authorization header".to_string()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::Unauthorized("Expected Bearer token".to_string()));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::Unauthorized("Expected Bearer token".to_string()));
    }

    Ok(token)
}

/// Rejects requests without a valid, unrevoked bearer token
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = state.auth.verify(bearer_token(req.headers())?).await?;

    req.extensions_mut().insert(AuthContext { claims });

    Ok(next.run(req).await)
}
