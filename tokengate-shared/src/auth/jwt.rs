/// JWT token issuance and validation module
///
/// Access tokens are compact JWS strings (`header.claims.signature`) signed with
/// HS256. The algorithm is pinned: the verify path only accepts HS256 and any
/// token whose header names another algorithm (including `none`) is rejected
/// as invalid before a single claim is read.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256), not negotiable
/// - **Expiration**: checked against an injected [`Clock`], zero leeway by default
/// - **Secret Management**: secrets should be at least 32 bytes (enforced by config)
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use chrono::Duration;
/// use tokengate_shared::auth::clock::SystemClock;
/// use tokengate_shared::auth::jwt::TokenCodec;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let codec = TokenCodec::new(b"your-secret-key-at-least-32-bytes", Arc::new(SystemClock))?;
///
/// let issued = codec.encode(1, "admin", &["USER".to_string()], Duration::hours(24))?;
/// let claims = codec.decode(&issued.token)?;
/// assert_eq!(claims, issued.claims);
/// # Ok(())
/// # }
/// ```

use crate::auth::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// The only algorithm this codec signs with or accepts
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Malformed structure, bad signature or unsupported algorithm
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Signature valid but the token is past its expiry
    #[error("Token has expired")]
    Expired,

    /// Signing secret unusable
    #[error("Invalid signing secret: {0}")]
    InvalidSecret(String),
}

/// JWT claims structure
///
/// # Claims
///
/// - `sub`: user id (serialized as a decimal string, as JWT requires)
/// - `username`: login name at issuance
/// - `roles`: ordered role list
/// - `iat` / `exp`: issued-at and expiry, seconds since the epoch
/// - `jti`: random id, makes every issued token distinct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user id
    #[serde(with = "subject")]
    pub sub: i64,

    /// Username
    pub username: String,

    /// Roles granted to the subject
    pub roles: Vec<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Token id
    pub jti: Uuid,
}

impl Claims {
    /// Builds claims issued at `issued_at` and valid for `ttl`
    ///
    /// # Errors
    ///
    /// Returns `TokenError::CreateError` if the expiry is not representable
    pub fn new(
        subject_id: i64,
        username: impl Into<String>,
        roles: Vec<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, TokenError> {
        let expiration = issued_at.checked_add_signed(ttl).ok_or_else(|| {
            TokenError::CreateError(format!("token lifetime of {} overflows", ttl))
        })?;

        Ok(Self {
            sub: subject_id,
            username: username.into(),
            roles,
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4(),
        })
    }

    /// Issued-at as a timestamp
    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or_default()
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }

    /// Whether the token is expired at `now`, allowing `leeway_seconds` of grace
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway_seconds: i64) -> bool {
        now.timestamp() >= self.exp.saturating_add(leeway_seconds)
    }

    /// Whether `role` is among the granted roles
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

mod subject {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// A freshly minted token with the claims embedded in it
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact JWS string
    pub token: String,

    /// Claims signed into `token`
    pub claims: Claims,
}

/// Signs and verifies access tokens
///
/// Holds the signing secret (read-only after construction) and the clock used
/// for issued-at and expiry checks.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
    leeway_seconds: i64,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &TOKEN_ALGORITHM)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Creates a codec with zero expiry leeway
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidSecret` if `secret` is empty
    pub fn new(secret: &[u8], clock: Arc<dyn Clock>) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidSecret("secret must not be empty".to_string()));
        }

        let mut validation = Validation::new(TOKEN_ALGORITHM);
        // Expiry is evaluated against the injected clock in `check_expiry`
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.required_spec_claims = ["exp".to_string()].into_iter().collect();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock,
            leeway_seconds: 0,
        })
    }

    /// Sets the expiry grace period
    pub fn with_leeway(mut self, leeway_seconds: i64) -> Self {
        self.leeway_seconds = leeway_seconds.max(0);
        self
    }

    /// Gets the expiry grace period in seconds
    pub fn leeway_seconds(&self) -> i64 {
        self.leeway_seconds
    }

    /// Gets the clock this codec reads
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Mints a token with `iat = now` and `exp = now + ttl`
    ///
    /// # Errors
    ///
    /// Returns `TokenError::CreateError` if the expiry overflows or signing fails
    pub fn encode(
        &self,
        subject_id: i64,
        username: &str,
        roles: &[String],
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        let claims = Claims::new(subject_id, username, roles.to_vec(), self.clock.now(), ttl)?;
        let token = self.sign(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    /// Signs an already-built claim set
    ///
    /// # Errors
    ///
    /// Returns `TokenError::CreateError` if serialization or signing fails
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(TOKEN_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| TokenError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Verifies a token and returns its claims
    ///
    /// The signature (and pinned algorithm) is checked first; claims are only
    /// interpreted after that succeeds. Expiry is then checked against the clock.
    ///
    /// # Errors
    ///
    /// - `TokenError::Invalid` for malformed structure, bad signature or a
    ///   header naming any algorithm other than HS256
    /// - `TokenError::Expired` if the signature is valid but `now >= exp`
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.decode_ignoring_expiry(token)?;

        if claims.is_expired_at(self.clock.now(), self.leeway_seconds) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Verifies signature and structure but not expiry
    ///
    /// Used where the caller needs the claims of a token that may already be
    /// past its expiry, such as logout recovering `exp`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` on any structural or signature failure
    pub fn decode_ignoring_expiry(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::Invalid("bad signature".to_string()),
                ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                    TokenError::Invalid("unsupported algorithm".to_string())
                }
                ErrorKind::MissingRequiredClaim(claim) => {
                    TokenError::Invalid(format!("missing claim: {}", claim))
                }
                _ => TokenError::Invalid(format!("malformed token: {}", e)),
            }
        })?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;

    const SECRET: &[u8] = b"test-secret-key-at-least-32-bytes-long";

    fn codec_at(start: DateTime<Utc>) -> (TokenCodec, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start));
        let codec = TokenCodec::new(SECRET, clock.clone()).unwrap();
        (codec, clock)
    }

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000, 0).unwrap()
    }

    fn roles() -> Vec<String> {
        vec!["USER".to_string(), "ADMIN".to_string()]
    }

    fn tamper_signature(token: &str) -> String {
        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut sig: Vec<char> = signature.chars().collect();
        sig[10] = if sig[10] == 'A' { 'B' } else { 'A' };
        format!("{}.{}", head, sig.into_iter().collect::<String>())
    }

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new(7, "alice", roles(), start(), Duration::hours(24)).unwrap();

        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.iat, start().timestamp());
        assert_eq!(claims.exp, start().timestamp() + 86_400);
        assert_eq!(claims.expires_at(), start() + Duration::hours(24));
        assert!(claims.has_role("ADMIN"));
        assert!(!claims.has_role("API_USER"));
    }

    #[test]
    fn test_unrepresentable_expiry_is_an_error() {
        let (codec, _clock) = codec_at(start());

        // Past the last representable year
        let err = codec
            .encode(1, "admin", &roles(), Duration::days(100_000_000))
            .unwrap_err();
        assert!(matches!(err, TokenError::CreateError(_)));
    }

    #[test]
    fn test_subject_serialized_as_string() {
        let claims = Claims::new(42, "bob", vec![], start(), Duration::hours(1)).unwrap();
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["sub"], "42");

        let back: Claims = serde_json::from_value(json).unwrap();
        assert_eq!(back, claims);
    }

    #[test]
    fn test_encode_decode_returns_same_claims() {
        let (codec, clock) = codec_at(start());

        let issued = codec.encode(1, "admin", &roles(), Duration::hours(24)).unwrap();
        assert_eq!(issued.token.split('.').count(), 3);

        clock.advance(Duration::hours(23));
        let decoded = codec.decode(&issued.token).expect("Should validate token");
        assert_eq!(decoded, issued.claims);
    }

    #[test]
    fn test_tokens_are_unique() {
        let (codec, _) = codec_at(start());
        let a = codec.encode(1, "admin", &roles(), Duration::hours(1)).unwrap();
        let b = codec.encode(1, "admin", &roles(), Duration::hours(1)).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_expired_token_is_expired_not_invalid() {
        let (codec, clock) = codec_at(start());
        let issued = codec.encode(1, "admin", &roles(), Duration::seconds(60)).unwrap();

        clock.advance(Duration::seconds(59));
        assert!(codec.decode(&issued.token).is_ok());

        // Zero grace: expired at exactly `exp`
        clock.advance(Duration::seconds(1));
        assert!(matches!(codec.decode(&issued.token), Err(TokenError::Expired)));

        clock.advance(Duration::days(30));
        assert!(matches!(codec.decode(&issued.token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_leeway_extends_validity() {
        let (codec, clock) = codec_at(start());
        let codec = codec.with_leeway(30);
        let issued = codec.encode(1, "admin", &roles(), Duration::seconds(60)).unwrap();

        clock.advance(Duration::seconds(80));
        assert!(codec.decode(&issued.token).is_ok());

        clock.advance(Duration::seconds(10));
        assert!(matches!(codec.decode(&issued.token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_decode_ignoring_expiry() {
        let (codec, clock) = codec_at(start());
        let issued = codec.encode(3, "carol", &roles(), Duration::seconds(5)).unwrap();

        clock.advance(Duration::hours(1));
        let claims = codec.decode_ignoring_expiry(&issued.token).unwrap();
        assert_eq!(claims.exp, issued.claims.exp);
    }

    #[test]
    fn test_flipped_signature_is_invalid() {
        let (codec, _) = codec_at(start());
        let issued = codec.encode(1, "admin", &roles(), Duration::hours(1)).unwrap();

        let tampered = tamper_signature(&issued.token);
        assert!(matches!(codec.decode(&tampered), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_bad_signature_rejected_even_when_expired() {
        let (codec, clock) = codec_at(start());
        let issued = codec.encode(1, "admin", &roles(), Duration::seconds(1)).unwrap();
        clock.advance(Duration::hours(1));

        let tampered = tamper_signature(&issued.token);
        assert!(matches!(codec.decode(&tampered), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let (codec, _) = codec_at(start());
        let other = TokenCodec::new(b"another-secret-key-of-sufficient-length", codec.clock().clone()).unwrap();

        let issued = codec.encode(1, "admin", &roles(), Duration::hours(1)).unwrap();
        assert!(matches!(other.decode(&issued.token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let (codec, clock) = codec_at(start());
        let claims = Claims::new(1, "admin", roles(), clock.now(), Duration::hours(1)).unwrap();

        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(codec.decode(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_alg_none_rejected() {
        let (codec, _) = codec_at(start());
        let issued = codec.encode(1, "admin", &roles(), Duration::hours(1)).unwrap();
        let claims_part = issued.token.split('.').nth(1).unwrap();

        // {"alg":"none","typ":"JWT"}
        let unsigned = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{}.", claims_part);
        assert!(matches!(codec.decode(&unsigned), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let (codec, _) = codec_at(start());
        for token in ["", "abc", "a.b", "a.b.c", "not.a.jwt.at.all"] {
            assert!(
                matches!(codec.decode(token), Err(TokenError::Invalid(_))),
                "token {:?} should be invalid",
                token
            );
        }
    }

    #[test]
    fn test_empty_secret_rejected() {
        let clock = Arc::new(ManualClock::new(start()));
        assert!(matches!(
            TokenCodec::new(b"", clock),
            Err(TokenError::InvalidSecret(_))
        ));
    }
}
