//! # Tokengate Shared Library
//!
//! Authentication core shared by the Tokengate API server and cleanup worker:
//! password hashing, signed access tokens, and token revocation with
//! expiry-based eviction.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, token codec, user lookup and the `AuthService`
//! - `revocation`: revocation stores (Postgres, Redis, in-memory)
//! - `models`: database records
//! - `db`: connection pool and migrations
//! - `redis`: Redis client wrapper
//! - `config`: environment configuration
//! - `bootstrap`: service construction from configuration

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod models;
pub mod redis;
pub mod revocation;

/// Current version of the Tokengate shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
