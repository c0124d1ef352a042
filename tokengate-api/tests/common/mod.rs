/// Common test utilities for integration tests
///
/// Builds the router over in-memory backends with a manually driven clock, so
/// no database or Redis is needed.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use tokengate_api::app::{build_router, AppState};
use tokengate_api::config::ApiConfig;
use tokengate_shared::auth::clock::ManualClock;
use tokengate_shared::auth::jwt::TokenCodec;
use tokengate_shared::auth::password::{PasswordConfig, PasswordHasher};
use tokengate_shared::auth::repository::InMemoryUserRepository;
use tokengate_shared::auth::{AuthService, AuthServiceConfig};
use tokengate_shared::models::user::CreateUser;
use tokengate_shared::revocation::InMemoryRevocationStore;
use tower::ServiceExt;

pub const SECRET: &[u8] = b"api-integration-secret-0123456789abcdef";

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: Router,
    pub clock: Arc<ManualClock>,
    pub users: Arc<InMemoryUserRepository>,
    pub revocations: Arc<InMemoryRevocationStore>,
}

impl TestContext {
    /// Creates a context with `admin`/`admin123` (ADMIN, USER) and
    /// `user`/`user123` (USER)
    pub async fn new() -> Self {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 7, 22, 10, 30, 0).unwrap()));
        let hasher = PasswordHasher::new(PasswordConfig::bcrypt(4)).unwrap();
        let users = Arc::new(InMemoryUserRepository::new());
        let revocations = Arc::new(InMemoryRevocationStore::with_clock(clock.clone()));

        for (username, password, roles) in [
            ("admin", "admin123", vec!["ADMIN", "USER"]),
            ("user", "user123", vec!["USER"]),
        ] {
            users
                .insert(CreateUser {
                    username: username.to_string(),
                    password_hash: hasher.hash(password).unwrap(),
                    enabled: true,
                    roles: roles.into_iter().map(String::from).collect(),
                })
                .await;
        }

        let service = AuthService::new(
            users.clone(),
            revocations.clone(),
            hasher,
            TokenCodec::new(SECRET, clock.clone()).unwrap(),
            AuthServiceConfig::default(),
        );

        let app = build_router(AppState::new(Arc::new(service), None, ApiConfig::default()));

        TestContext {
            app,
            clock,
            users,
            revocations,
        }
    }

    /// Sends a request and returns status plus JSON body
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };

        (status, json)
    }

    /// Logs in and returns the token
    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self.send(login_request(username, password)).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }
}

pub fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/user-management/login")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({ "username": username, "password": password }).to_string(),
        ))
        .unwrap()
}

pub fn authed(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}
