//! Registration, login and password changes against `PostgreSQL`.
//!
//! Run with: `cargo test -p storerate-integration-tests -- --ignored`

use axum::http::StatusCode;
use serde_json::json;

use storerate_integration_tests::{PASSWORD, TestContext, unique_email};

#[tokio::test]
#[ignore = "Requires STORERATE_TEST_DATABASE_URL"]
async fn test_registration_enforces_name_length() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Fifteen Chars!!",
                "email": unique_email("short"),
                "password": PASSWORD,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "errors": ["Name must be between 20 and 60 characters"] })
    );

    let (status, body) = ctx
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Twenty Five Character Nme",
                "email": unique_email("long"),
                "password": PASSWORD,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user"]["role"], "USER");
    assert!(body["token"].is_string());
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
#[ignore = "Requires STORERATE_TEST_DATABASE_URL"]
async fn test_duplicate_registration_conflicts() {
    let ctx = TestContext::new().await;
    let email = unique_email("dup");
    let request = json!({
        "name": "Duplicate Registration User",
        "email": email,
        "password": PASSWORD,
    });

    let (first, _) = ctx
        .send("POST", "/api/auth/register", None, Some(request.clone()))
        .await;
    assert_eq!(first, StatusCode::CREATED);

    let (second, body) = ctx
        .send("POST", "/api/auth/register", None, Some(request))
        .await;
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(
        body,
        json!({ "message": "User with this email already exists" })
    );
}

#[tokio::test]
#[ignore = "Requires STORERATE_TEST_DATABASE_URL"]
async fn test_login_and_password_change() {
    let ctx = TestContext::new().await;
    let email = unique_email("login");

    let (status, _) = ctx
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Password Changing User",
                "email": email,
                "password": PASSWORD,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Emails are matched case-insensitively
    let (status, body) = ctx
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email.to_uppercase(), "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let token = body["token"].as_str().unwrap_or_default().to_string();

    let (status, body) = ctx
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": "Wrong!Pass1" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "message": "Invalid credentials" }));

    let (status, body) = ctx
        .send(
            "POST",
            "/api/auth/change-password",
            Some(&token),
            Some(json!({ "currentPassword": "Wrong!Pass1", "newPassword": "Changed#Pass2" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "message": "Current password is incorrect" }));

    let (status, _) = ctx
        .send(
            "POST",
            "/api/auth/change-password",
            Some(&token),
            Some(json!({ "currentPassword": PASSWORD, "newPassword": "Changed#Pass2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": "Changed#Pass2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires STORERATE_TEST_DATABASE_URL"]
async fn test_deleted_user_token_is_rejected() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin().await;
    let (id, token) = ctx.register("Soon To Be Deleted Account").await;

    let (status, _) = ctx
        .send("DELETE", &format!("/api/users/{id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .send("GET", &format!("/api/users/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "message": "User not found" }));
}
