/// Request middleware
///
/// - `auth`: bearer token extraction and verification

pub mod auth;
