/// API route handlers
///
/// - `health`: service descriptor and health check
/// - `auth`: login, logout and identity
/// - `admin`: revocation maintenance

pub mod admin;
pub mod auth;
pub mod health;
