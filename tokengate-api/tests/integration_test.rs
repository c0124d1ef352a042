/// Integration tests for the Tokengate API
///
/// These drive the full router (routing, auth middleware, error mapping)
/// against in-memory backends:
/// - Login success and the shared failure message
/// - Logout and revocation
/// - Token expiry
/// - Admin cleanup authorization

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Duration;
use common::{authed, login_request, TestContext};
use tokengate_shared::revocation::RevocationStore;

#[tokio::test]
async fn test_root_and_health() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send(Request::get("/").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["login"], "/user-management/login");

    let (status, body) = ctx
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "tokengate");
    assert_eq!(body["database"], "not_configured");
}

#[tokio::test]
async fn test_login_success() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.send(login_request("admin", "admin123")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 86400);
    assert_eq!(body["user"]["username"], "admin");
    assert_eq!(body["user"]["roles"], serde_json::json!(["ADMIN", "USER"]));
}

#[tokio::test]
async fn test_login_trims_username() {
    let ctx = TestContext::new().await;
    let (status, _) = ctx.send(login_request("  user  ", "user123")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_share_message() {
    let ctx = TestContext::new().await;
    ctx.users.set_enabled("user", false).await;

    let (wrong_status, wrong) = ctx.send(login_request("admin", "wrong")).await;
    let (ghost_status, ghost) = ctx.send(login_request("ghost", "whatever")).await;
    let (disabled_status, disabled) = ctx.send(login_request("user", "user123")).await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(ghost_status, StatusCode::UNAUTHORIZED);
    assert_eq!(disabled_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong["message"], "Invalid username or password");
    assert_eq!(wrong, ghost);
    assert_eq!(wrong, disabled);
}

#[tokio::test]
async fn test_login_validation() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.send(login_request("ab", "secret")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "username");

    let (status, _) = ctx.send(login_request("admin", "")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Missing field is rejected by the JSON extractor
    let request = Request::builder()
        .method("POST")
        .uri("/user-management/login")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"username":"admin"}"#))
        .unwrap();
    let (status, _) = ctx.send(request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_me_requires_valid_token() {
    let ctx = TestContext::new().await;
    let token = ctx.login("user", "user123").await;

    let (status, body) = ctx.send(authed("GET", "/user-management/me", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "user");
    assert_eq!(body["roles"], serde_json::json!(["USER"]));

    let (status, _) = ctx
        .send(Request::get("/user-management/me").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.send(authed("GET", "/user-management/me", "not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let ctx = TestContext::new().await;
    let token = ctx.login("user", "user123").await;

    let (status, body) = ctx.send(authed("POST", "/user-management/logout", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logout successful");
    assert!(body["timestamp"].is_string());

    let (status, body) = ctx.send(authed("GET", "/user-management/me", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has been revoked");

    // Second logout of the same token still succeeds
    let (status, _) = ctx.send(authed("POST", "/user-management/logout", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ctx.revocations.is_revoked(&token).await.unwrap());
}

#[tokio::test]
async fn test_logout_rejects_bad_tokens() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .send(authed("POST", "/user-management/logout", "invalid_token"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .send(
            Request::post("/user-management/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token() {
    let ctx = TestContext::new().await;
    let token = ctx.login("user", "user123").await;

    ctx.clock.advance(Duration::hours(24));

    let (status, body) = ctx.send(authed("GET", "/user-management/me", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has expired");

    // Logging out an expired token is a no-op success
    let (status, _) = ctx.send(authed("POST", "/user-management/logout", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ctx.revocations.is_empty().await);
}

#[tokio::test]
async fn test_cleanup_requires_admin() {
    let ctx = TestContext::new().await;
    let user_token = ctx.login("user", "user123").await;

    let (status, body) = ctx
        .send(authed("POST", "/admin/cleanup-tokens", &user_token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin access required");

    let (status, _) = ctx
        .send(Request::post("/admin/cleanup-tokens").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cleanup_evicts_expired_revocations() {
    let ctx = TestContext::new().await;

    let stale = ctx.login("user", "user123").await;
    ctx.send(authed("POST", "/user-management/logout", &stale)).await;

    ctx.clock.advance(Duration::hours(24));
    let admin_token = ctx.login("admin", "admin123").await;

    let (status, body) = ctx
        .send(authed("POST", "/admin/cleanup-tokens", &admin_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleaned_tokens"], 1);
    assert_eq!(body["message"], "Cleaned up 1 expired tokens");

    let (_, body) = ctx
        .send(authed("POST", "/admin/cleanup-tokens", &admin_token))
        .await;
    assert_eq!(body["cleaned_tokens"], 0);
}
