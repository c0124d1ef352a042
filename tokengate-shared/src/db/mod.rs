/// Database layer
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health check
/// - `migrations`: embedded migration runner
///
/// Table access lives next to the types it serves: users in
/// [`crate::models::user`], revocations in [`crate::revocation::postgres`].

pub mod migrations;
pub mod pool;
