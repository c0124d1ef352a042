/// Authentication outcomes returned to the transport layer
///
/// Store failures of every kind collapse into `StoreUnavailable`, which callers
/// must treat as a rejection.

use crate::auth::jwt::TokenError;
use crate::auth::repository::RepositoryError;
use crate::revocation::RevocationError;

/// Error type for [`AuthService`](crate::auth::service::AuthService) operations
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown username or wrong password; the two are never distinguished
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Account exists but is disabled
    #[error("Account is disabled")]
    AccountDisabled,

    /// Malformed, forged or wrong-algorithm token
    #[error("Invalid token")]
    InvalidToken,

    /// Token signature is valid but it is past its expiry
    #[error("Token has expired")]
    Expired,

    /// Token was explicitly revoked
    #[error("Token has been revoked")]
    Revoked,

    /// Backing store unreachable or timed out
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Unexpected failure inside the service
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Short machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::AccountDisabled => "account_disabled",
            AuthError::InvalidToken => "invalid_token",
            AuthError::Expired => "token_expired",
            AuthError::Revoked => "token_revoked",
            AuthError::StoreUnavailable(_) => "store_unavailable",
            AuthError::Internal(_) => "internal_error",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid(_) => AuthError::InvalidToken,
            TokenError::Expired => AuthError::Expired,
            TokenError::CreateError(msg) | TokenError::InvalidSecret(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<RevocationError> for AuthError {
    fn from(err: RevocationError) -> Self {
        match err {
            RevocationError::Unavailable(msg) => AuthError::StoreUnavailable(msg),
        }
    }
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Unavailable(msg) => AuthError::StoreUnavailable(msg),
        }
    }
}
