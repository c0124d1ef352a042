//! # Tokengate Worker Library
//!
//! Background maintenance for the authentication core.
//!
//! ## Modules
//!
//! - `cleanup`: periodic eviction of expired revocation entries

pub mod cleanup;

pub use cleanup::CleanupJob;
