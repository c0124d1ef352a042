/// Password hashing module
///
/// Provides one-way password hashing and constant-time verification. Two
/// adaptive, salted schemes are supported:
///
/// - **bcrypt** (`$2a$`, default cost 10): the legacy account store was written
///   with this exact variant, so it is the default for new hashes as well.
/// - **Argon2id** (`$argon2id$v=19$...`): memory-hard alternative, selectable via
///   configuration.
///
/// Every hash string is self-describing (algorithm, cost, salt, digest), so
/// verification never needs side-channel configuration. Verification accepts
/// hashes of either scheme regardless of which one is configured for hashing.
///
/// # Example
///
/// ```
/// use tokengate_shared::auth::password::{PasswordConfig, PasswordHasher};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = PasswordHasher::new(PasswordConfig::bcrypt(4))?;
///
/// let hash = hasher.hash("super_secret_password_123")?;
/// assert!(hash.starts_with("$2a$04$"));
///
/// assert!(hasher.verify("super_secret_password_123", &hash));
/// assert!(!hasher.verify("wrong_password", &hash));
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Argon2, Params, Version,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Lowest bcrypt cost accepted by the bcrypt algorithm
pub const MIN_BCRYPT_COST: u32 = 4;

/// Highest bcrypt cost accepted by the bcrypt algorithm
pub const MAX_BCRYPT_COST: u32 = 31;

/// Cost used by the legacy account store (`$2a$10$...`)
pub const LEGACY_BCRYPT_COST: u32 = 10;

/// Placeholder hashed once per hasher for the "user not found" path
const DUMMY_PASSWORD: &str = "tokengate-placeholder-password";

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Hasher configured with out-of-range parameters
    #[error("Invalid password hashing parameters: {0}")]
    InvalidParameters(String),

    /// Unknown scheme name in configuration
    #[error("Unknown password hash scheme: {0}")]
    UnknownScheme(String),
}

/// Hash scheme used for new hashes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashScheme {
    /// bcrypt, `$2a$` variant
    Bcrypt,

    /// Argon2id, PHC string format
    Argon2id,
}

impl HashScheme {
    /// Gets scheme as string
    pub fn as_str(&self) -> &'static str {
        match self {
            HashScheme::Bcrypt => "bcrypt",
            HashScheme::Argon2id => "argon2id",
        }
    }

    /// Detects the scheme of a stored hash from its prefix
    ///
    /// Returns `None` for anything that is not a recognised self-describing
    /// hash string.
    pub fn detect(hash: &str) -> Option<Self> {
        if ["$2a$", "$2b$", "$2y$", "$2x$"]
            .iter()
            .any(|prefix| hash.starts_with(prefix))
        {
            Some(HashScheme::Bcrypt)
        } else if hash.starts_with("$argon2id$") {
            Some(HashScheme::Argon2id)
        } else {
            None
        }
    }
}

impl FromStr for HashScheme {
    type Err = PasswordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bcrypt" => Ok(HashScheme::Bcrypt),
            "argon2id" | "argon2" => Ok(HashScheme::Argon2id),
            other => Err(PasswordError::UnknownScheme(other.to_string())),
        }
    }
}

/// Password hashing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    /// Scheme used for new hashes
    pub scheme: HashScheme,

    /// bcrypt cost factor (log2 rounds)
    pub bcrypt_cost: u32,

    /// Argon2 memory cost in KiB
    pub argon2_memory_kib: u32,

    /// Argon2 iterations
    pub argon2_iterations: u32,

    /// Argon2 parallel lanes
    pub argon2_parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            scheme: HashScheme::Bcrypt,
            bcrypt_cost: LEGACY_BCRYPT_COST,
            argon2_memory_kib: 65536,
            argon2_iterations: 3,
            argon2_parallelism: 4,
        }
    }
}

impl PasswordConfig {
    /// bcrypt configuration with the given cost
    pub fn bcrypt(cost: u32) -> Self {
        Self {
            scheme: HashScheme::Bcrypt,
            bcrypt_cost: cost,
            ..Default::default()
        }
    }

    /// Argon2id configuration with the given memory (KiB), iterations and lanes
    pub fn argon2id(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            scheme: HashScheme::Argon2id,
            argon2_memory_kib: memory_kib,
            argon2_iterations: iterations,
            argon2_parallelism: parallelism,
            ..Default::default()
        }
    }

    fn argon2_params(&self) -> Result<Params, PasswordError> {
        Params::new(
            self.argon2_memory_kib,
            self.argon2_iterations,
            self.argon2_parallelism,
            Some(32),
        )
        .map_err(|e| PasswordError::InvalidParameters(e.to_string()))
    }
}

/// Password hasher
///
/// Cheap to clone; the placeholder hash used by [`PasswordHasher::verify_dummy`]
/// is computed once at construction and shared.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    config: Arc<PasswordConfig>,
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    /// Creates a hasher, validating the configured parameters
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::InvalidParameters` if the bcrypt cost or the
    /// Argon2 parameters are out of range.
    pub fn new(config: PasswordConfig) -> Result<Self, PasswordError> {
        match config.scheme {
            HashScheme::Bcrypt => {
                if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&config.bcrypt_cost) {
                    return Err(PasswordError::InvalidParameters(format!(
                        "bcrypt cost must be between {} and {}, got {}",
                        MIN_BCRYPT_COST, MAX_BCRYPT_COST, config.bcrypt_cost
                    )));
                }
            }
            HashScheme::Argon2id => {
                config.argon2_params()?;
            }
        }

        let dummy_hash = hash_with(&config, DUMMY_PASSWORD)?;

        Ok(Self {
            config: Arc::new(config),
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    /// Gets the hashing configuration
    pub fn config(&self) -> &PasswordConfig {
        &self.config
    }

    /// Hashes a password with a fresh random salt
    ///
    /// Two calls with the same input never return the same string.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::HashError` if the underlying algorithm fails
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        hash_with(&self.config, password)
    }

    /// Verifies a password against a stored hash
    ///
    /// Uses the parameters embedded in `hash` and compares in constant time.
    /// Never errors: a malformed hash or an unrecognised algorithm tag yields
    /// `false` and a data-integrity warning in the log.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match HashScheme::detect(hash) {
            Some(HashScheme::Bcrypt) => match bcrypt::verify(password, hash) {
                Ok(matches) => matches,
                Err(e) => {
                    tracing::warn!(scheme = "bcrypt", error = %e, "Malformed stored password hash");
                    false
                }
            },
            Some(HashScheme::Argon2id) => {
                let parsed = match PasswordHash::new(hash) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        tracing::warn!(scheme = "argon2id", error = %e, "Malformed stored password hash");
                        return false;
                    }
                };

                // Parameters come from the parsed hash, not from `Argon2::default()`
                match Argon2::default().verify_password(password.as_bytes(), &parsed) {
                    Ok(()) => true,
                    Err(argon2::password_hash::Error::Password) => false,
                    Err(e) => {
                        tracing::warn!(scheme = "argon2id", error = %e, "Stored password hash failed verification");
                        false
                    }
                }
            }
            None => {
                tracing::warn!("Stored password hash has an unrecognised algorithm tag");
                false
            }
        }
    }

    /// Burns the same amount of work as a real verification
    ///
    /// Called on "user not found" paths so that response latency does not
    /// reveal whether a username exists. Always returns `false`.
    pub fn verify_dummy(&self, password: &str) -> bool {
        let _ = self.verify(password, &self.dummy_hash);
        false
    }

    /// Reports whether a stored hash should be re-hashed with current settings
    ///
    /// True when the stored hash uses a different scheme or different cost
    /// parameters than this hasher is configured with, or is unparseable.
    pub fn needs_rehash(&self, hash: &str) -> bool {
        match (HashScheme::detect(hash), self.config.scheme) {
            (Some(HashScheme::Bcrypt), HashScheme::Bcrypt) => {
                let cost = hash
                    .get(4..6)
                    .and_then(|c| c.parse::<u32>().ok());
                cost != Some(self.config.bcrypt_cost)
            }
            (Some(HashScheme::Argon2id), HashScheme::Argon2id) => {
                let Ok(parsed) = PasswordHash::new(hash) else {
                    return true;
                };
                let Ok(params) = Params::try_from(&parsed) else {
                    return true;
                };
                params.m_cost() != self.config.argon2_memory_kib
                    || params.t_cost() != self.config.argon2_iterations
                    || params.p_cost() != self.config.argon2_parallelism
            }
            _ => true,
        }
    }
}

fn hash_with(config: &PasswordConfig, password: &str) -> Result<String, PasswordError> {
    match config.scheme {
        HashScheme::Bcrypt => {
            let parts = bcrypt::hash_with_result(password, config.bcrypt_cost)
                .map_err(|e| PasswordError::HashError(format!("bcrypt failed: {}", e)))?;
            Ok(parts.format_for_version(bcrypt::Version::TwoA))
        }
        HashScheme::Argon2id => {
            let salt = SaltString::generate(&mut OsRng);
            let argon2 = Argon2::new(
                argon2::Algorithm::Argon2id,
                Version::V0x13,
                config.argon2_params()?,
            );

            let password_hash = argon2
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

            Ok(password_hash.to_string())
        }
    }
}
