/// Authentication core
///
/// # Modules
///
/// - [`password`]: bcrypt / Argon2id hashing and verification
/// - [`clock`]: injectable time source
/// - [`jwt`]: HS256 claims and token codec
/// - [`repository`]: user lookup by username
/// - [`error`]: outcomes returned to the transport layer
/// - [`service`]: login, verify, logout and revocation cleanup
///
/// # Security Features
///
/// - **Password Hashing**: legacy-compatible bcrypt `$2a$` (cost 10) by default,
///   Argon2id selectable; constant-time verification and a placeholder hash on
///   the unknown-user path
/// - **Tokens**: HS256 only, the verify path rejects any other header algorithm
/// - **Revocation**: checked before decoding; an unreachable store rejects
///
/// # Example
///
/// ```
/// use tokengate_shared::auth::password::{PasswordConfig, PasswordHasher};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = PasswordHasher::new(PasswordConfig::bcrypt(4))?;
/// let hash = hasher.hash("user_password")?;
/// assert!(hasher.verify("user_password", &hash));
/// # Ok(())
/// # }
/// ```

pub mod clock;
pub mod error;
pub mod jwt;
pub mod password;
pub mod repository;
pub mod service;

pub use error::AuthError;
pub use service::{AuthService, AuthServiceConfig, AuthenticatedSession, LogoutReceipt};
