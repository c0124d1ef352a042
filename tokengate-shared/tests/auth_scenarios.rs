/// End-to-end authentication scenarios
///
/// Runs against the in-memory user repository and revocation store with a
/// manually driven clock; no external services needed.

use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use tokengate_shared::auth::clock::{Clock, ManualClock};
use tokengate_shared::auth::jwt::TokenCodec;
use tokengate_shared::auth::password::{PasswordConfig, PasswordHasher};
use tokengate_shared::auth::repository::InMemoryUserRepository;
use tokengate_shared::auth::{AuthError, AuthService, AuthServiceConfig};
use tokengate_shared::models::user::CreateUser;
use tokengate_shared::revocation::{InMemoryRevocationStore, RevocationStore};

const SECRET: &[u8] = b"scenario-secret-key-0123456789abcdef";

struct Harness {
    service: AuthService,
    clock: Arc<ManualClock>,
    revocations: Arc<InMemoryRevocationStore>,
}

async fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap()));
    let hasher = PasswordHasher::new(PasswordConfig::bcrypt(4)).unwrap();
    let users = Arc::new(InMemoryUserRepository::new());
    let revocations = Arc::new(InMemoryRevocationStore::with_clock(clock.clone()));

    users
        .insert(CreateUser {
            username: "admin".to_string(),
            password_hash: hasher.hash("admin123").unwrap(),
            enabled: true,
            roles: vec!["ADMIN".to_string(), "USER".to_string()],
        })
        .await;
    users
        .insert(CreateUser {
            username: "user".to_string(),
            password_hash: hasher.hash("user123").unwrap(),
            enabled: true,
            roles: vec!["USER".to_string()],
        })
        .await;
    users
        .insert(CreateUser {
            username: "suspended".to_string(),
            password_hash: hasher.hash("suspended123").unwrap(),
            enabled: false,
            roles: vec!["USER".to_string()],
        })
        .await;

    let service = AuthService::new(
        users,
        revocations.clone(),
        hasher,
        TokenCodec::new(SECRET, clock.clone()).unwrap(),
        AuthServiceConfig {
            token_ttl: Duration::hours(24),
            ..Default::default()
        },
    );

    Harness {
        service,
        clock,
        revocations,
    }
}

#[tokio::test]
async fn test_admin_login_carries_admin_role() {
    let h = harness().await;
    let session = h.service.authenticate("admin", "admin123").await.unwrap();

    assert!(session.claims.roles.contains(&"ADMIN".to_string()));
    assert_eq!(session.expires_in, 24 * 3600);

    let claims = h.service.verify(&session.token).await.unwrap();
    assert_eq!(claims, session.claims);
}

#[tokio::test]
async fn test_wrong_password_and_unknown_user_are_indistinguishable() {
    let h = harness().await;

    let wrong = h.service.authenticate("admin", "wrong").await.unwrap_err();
    let ghost = h.service.authenticate("ghost", "x").await.unwrap_err();

    assert!(matches!(wrong, AuthError::InvalidCredentials));
    assert!(matches!(ghost, AuthError::InvalidCredentials));
    assert_eq!(wrong.to_string(), ghost.to_string());
}

#[tokio::test]
async fn test_disabled_account_rejected() {
    let h = harness().await;
    let err = h.service.authenticate("suspended", "suspended123").await.unwrap_err();
    assert!(matches!(err, AuthError::AccountDisabled));
}

#[tokio::test]
async fn test_logout_then_verify_is_revoked() {
    let h = harness().await;
    let session = h.service.authenticate("user", "user123").await.unwrap();

    h.clock.advance(Duration::minutes(10));
    let receipt = h.service.logout(&session.token).await.unwrap();
    let err = h.service.verify(&session.token).await.unwrap_err();
    assert!(matches!(err, AuthError::Revoked));

    let entry = h.revocations.entry(&session.token).await.unwrap();
    assert_eq!(entry.revoked_at, receipt.logged_out_at);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let h = harness().await;
    let session = h.service.authenticate("user", "user123").await.unwrap();

    let first = h.service.logout(&session.token).await.unwrap();
    h.clock.advance(Duration::seconds(5));
    let second = h.service.logout(&session.token).await.unwrap();

    assert!(second.logged_out_at > first.logged_out_at);
    assert_eq!(h.revocations.len().await, 1);
}

#[tokio::test]
async fn test_token_expires_after_ttl() {
    let h = harness().await;
    let session = h.service.authenticate("user", "user123").await.unwrap();

    h.clock.advance(Duration::hours(24) - Duration::seconds(1));
    assert!(h.service.verify(&session.token).await.is_ok());

    h.clock.advance(Duration::seconds(1));
    let err = h.service.verify(&session.token).await.unwrap_err();
    assert!(matches!(err, AuthError::Expired));
}

#[tokio::test]
async fn test_other_sessions_survive_logout() {
    let h = harness().await;
    let first = h.service.authenticate("user", "user123").await.unwrap();
    let second = h.service.authenticate("user", "user123").await.unwrap();
    assert_ne!(first.token, second.token);

    h.service.logout(&first.token).await.unwrap();
    assert!(h.service.verify(&second.token).await.is_ok());
}

#[tokio::test]
async fn test_token_from_other_secret_is_invalid() {
    let h = harness().await;
    let foreign = TokenCodec::new(b"some-other-secret-0123456789abcdef!!", h.clock.clone())
        .unwrap()
        .encode(1, "admin", &["ADMIN".to_string()], Duration::hours(1))
        .unwrap();

    let err = h.service.verify(&foreign.token).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));

    let err = h.service.logout(&foreign.token).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));
}

#[tokio::test]
async fn test_cleanup_evicts_only_expired_entries() {
    let h = harness().await;
    let early = h.service.authenticate("user", "user123").await.unwrap();
    h.service.logout(&early.token).await.unwrap();

    h.clock.advance(Duration::hours(12));
    let late = h.service.authenticate("admin", "admin123").await.unwrap();
    h.service.logout(&late.token).await.unwrap();

    assert_eq!(h.service.cleanup().await.unwrap(), 0);

    h.clock.advance(Duration::hours(12));
    assert_eq!(h.service.cleanup().await.unwrap(), 1);
    assert_eq!(h.service.cleanup().await.unwrap(), 0);

    assert!(!h.revocations.is_revoked(&early.token).await.unwrap());
    assert!(h.revocations.is_revoked(&late.token).await.unwrap());
    assert!(matches!(h.service.verify(&late.token).await, Err(AuthError::Revoked)));
}

#[tokio::test]
async fn test_concurrent_logins_and_logouts() {
    let h = Arc::new(harness().await);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let h = h.clone();
        handles.push(tokio::spawn(async move {
            let session = h.service.authenticate("user", "user123").await.unwrap();
            h.service.logout(&session.token).await.unwrap();
            h.service.logout(&session.token).await.unwrap();
            session.token
        }));
    }

    let mut tokens = Vec::new();
    for handle in handles {
        tokens.push(handle.await.unwrap());
    }

    assert_eq!(h.revocations.len().await, 8);
    for token in &tokens {
        assert!(matches!(h.service.verify(token).await, Err(AuthError::Revoked)));
    }

    h.clock.set(h.clock.now() + Duration::hours(25));
    assert_eq!(h.service.cleanup().await.unwrap(), 8);
}
